use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{AnalysisOutcome, AnalysisRequester, DecisionInput, DecisionRequest};
use crate::error::{AppResult, StorageError};
use crate::storage::DecisionStore;

/// Validate → analyze → record pipeline behind the HTTP endpoint and the CLI.
#[derive(Clone)]
pub struct DecisionSimulator {
    requester: AnalysisRequester,
    store: Arc<dyn DecisionStore>,
}

impl DecisionSimulator {
    pub fn new(requester: AnalysisRequester, store: Arc<dyn DecisionStore>) -> Self {
        Self { requester, store }
    }

    pub fn requester(&self) -> &AnalysisRequester {
        &self.requester
    }

    pub fn store(&self) -> &Arc<dyn DecisionStore> {
        &self.store
    }

    /// Validate a raw request, analyze it and persist the result.
    pub async fn simulate(&self, request: DecisionRequest) -> AppResult<AnalysisOutcome> {
        let input = request.validate()?;
        self.analyze_and_record(&input).await
    }

    /// Analyze a validated decision and append exactly one record on success.
    ///
    /// Nothing is written when every backend fails. The record is not
    /// transactionally tied to the model call.
    pub async fn analyze_and_record(&self, input: &DecisionInput) -> AppResult<AnalysisOutcome> {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        debug!(%request_id, constraints = input.constraints().len(), "Analyzing decision");

        let outcome = self.requester.request(input).await.map_err(|e| {
            warn!(%request_id, error = %e, "Every backend failed");
            e
        })?;

        let response =
            serde_json::to_value(&outcome.analysis).map_err(StorageError::Serialization)?;
        let record_id = self
            .store
            .save(
                input.decision(),
                &response,
                &outcome.model_used,
                outcome.fallback_used,
            )
            .await?;

        info!(
            %request_id,
            record_id,
            model_used = %outcome.model_used,
            fallback_used = outcome.fallback_used,
            latency_ms = start.elapsed().as_millis(),
            "Decision analysed and recorded"
        );

        Ok(outcome)
    }

    /// Analyze without persisting.
    pub async fn analyze(&self, input: &DecisionInput) -> AppResult<AnalysisOutcome> {
        Ok(self.requester.request(input).await?)
    }
}
