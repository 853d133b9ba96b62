//! Structured output the model is required to return.
//!
//! Parsing a completion into [`DecisionAnalysis`] is the validation step:
//! missing fields, wrong types and an out-of-range `confidence_score` are all
//! rejected. Nothing is clamped or filled in.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::extract_json_from_completion;
use crate::error::{BackendError, BackendResult};

/// Inclusive bounds for `confidence_score`.
pub const CONFIDENCE_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub risk: String,
    pub impact_level: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub title: String,
    pub description: String,
    pub likelihood: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeOption {
    pub option: String,
    pub why_safer: String,
}

/// Risk and outcome analysis of a single decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnalysis {
    pub decision_summary: String,
    pub risks: Vec<RiskFactor>,
    pub best_case: Outcome,
    pub worst_case: Outcome,
    pub most_likely_case: Outcome,
    pub alternatives: Vec<AlternativeOption>,
    pub confidence_score: i64,
    pub uncertainty_explanation: String,
}

impl DecisionAnalysis {
    /// Field names the model must emit, in schema order.
    pub const FIELDS: [&'static str; 8] = [
        "decision_summary",
        "risks",
        "best_case",
        "worst_case",
        "most_likely_case",
        "alternatives",
        "confidence_score",
        "uncertainty_explanation",
    ];

    /// Parse and validate raw completion text.
    pub fn from_completion(completion: &str) -> BackendResult<Self> {
        let json_str = extract_json_from_completion(completion).map_err(|e| {
            warn!(
                error = %e,
                completion_preview = %completion.chars().take(200).collect::<String>(),
                "Failed to extract JSON from model output"
            );
            BackendError::Schema { message: e }
        })?;

        let analysis: DecisionAnalysis =
            serde_json::from_str(json_str).map_err(|e| BackendError::Schema {
                message: e.to_string(),
            })?;

        analysis.validate()?;
        Ok(analysis)
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> BackendResult<()> {
        if !CONFIDENCE_RANGE.contains(&self.confidence_score) {
            return Err(BackendError::Schema {
                message: format!(
                    "confidence_score must be between 0 and 100, got {}",
                    self.confidence_score
                ),
            });
        }
        Ok(())
    }
}
