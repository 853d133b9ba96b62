use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::{DecisionAnalysis, DecisionInput};
use crate::backend::AnalysisBackend;
use crate::config::FallbackPolicy;
use crate::error::{BackendError, BackendResult};
use crate::prompts::format_decision_prompt;

/// Successful analysis together with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub analysis: DecisionAnalysis,
    pub model_used: String,
    pub fallback_used: bool,
}

/// Position of an attempt in the backend chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Fallback(usize),
}

impl Attempt {
    fn at(index: usize) -> Self {
        match index {
            0 => Attempt::Primary,
            n => Attempt::Fallback(n),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Attempt::Fallback(_))
    }
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Primary => write!(f, "primary"),
            Attempt::Fallback(n) => write!(f, "fallback#{}", n),
        }
    }
}

/// Runs a prompt against an ordered list of backends.
///
/// Attempts are strictly sequential: the next backend is only tried after the
/// previous one has definitively failed. The error of the last attempt is
/// returned when every attempt fails.
#[derive(Clone)]
pub struct AnalysisRequester {
    backends: Vec<Arc<dyn AnalysisBackend>>,
    policy: FallbackPolicy,
}

impl AnalysisRequester {
    pub fn new(backends: Vec<Arc<dyn AnalysisBackend>>, policy: FallbackPolicy) -> Self {
        Self { backends, policy }
    }

    /// Primary plus a single fallback under the default policy.
    pub fn with_fallback(
        primary: Arc<dyn AnalysisBackend>,
        fallback: Arc<dyn AnalysisBackend>,
    ) -> Self {
        Self::new(vec![primary, fallback], FallbackPolicy::default())
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    /// Identifiers of the backends in attempt order.
    pub fn model_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.model_id()).collect()
    }

    /// Format the prompt for `input` and run it through the backend chain.
    pub async fn request(&self, input: &DecisionInput) -> BackendResult<AnalysisOutcome> {
        let prompt = format_decision_prompt(input);
        self.request_prompt(&prompt).await
    }

    pub async fn request_prompt(&self, prompt: &str) -> BackendResult<AnalysisOutcome> {
        let mut last_error = None;

        for (index, backend) in self
            .backends
            .iter()
            .take(self.policy.max_attempts)
            .enumerate()
        {
            let attempt = Attempt::at(index);
            let start = Instant::now();

            match self.run_attempt(backend.as_ref(), prompt).await {
                Ok(analysis) => {
                    info!(
                        model = %backend.model_id(),
                        attempt = %attempt,
                        latency_ms = start.elapsed().as_millis(),
                        confidence_score = analysis.confidence_score,
                        "Analysis attempt succeeded"
                    );
                    return Ok(AnalysisOutcome {
                        analysis,
                        model_used: backend.model_id().to_string(),
                        fallback_used: attempt.is_fallback(),
                    });
                }
                Err(e) => {
                    warn!(
                        model = %backend.model_id(),
                        attempt = %attempt,
                        latency_ms = start.elapsed().as_millis(),
                        error = %e,
                        "Analysis attempt failed"
                    );

                    let stop = e.is_invalid_output() && !self.policy.fallback_on_invalid_output;
                    last_error = Some(e);
                    if stop {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(BackendError::NoBackends))
    }

    async fn run_attempt(
        &self,
        backend: &dyn AnalysisBackend,
        prompt: &str,
    ) -> BackendResult<DecisionAnalysis> {
        match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, backend.analyze(prompt))
                .await
                .map_err(|_| BackendError::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                })?,
            None => backend.analyze(prompt).await,
        }
    }
}
