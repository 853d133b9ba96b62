use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::SharedState;
use crate::analysis::{AnalysisOutcome, DecisionRequest};
use crate::error::{AppError, ValidationError};

/// Body of `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Liveness check.
pub async fn root() -> Json<StatusBody> {
    Json(StatusBody {
        status: "Backend running".to_string(),
    })
}

/// `POST /analyze-decision`
pub async fn analyze_decision(
    State(state): State<SharedState>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::Validation(ValidationError::new("body", e.body_text())))?;

    let outcome = state.simulator.simulate(request).await?;
    Ok(Json(outcome))
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
