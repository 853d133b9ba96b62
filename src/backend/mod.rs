//! Inference backends.
//!
//! A backend turns a formatted prompt into a validated [`DecisionAnalysis`].
//! [`ModelBackend`] is the production implementation: one model identifier
//! served through an OpenAI-compatible [`ChatClient`].

mod client;
mod types;


pub use client::ChatClient;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::analysis::DecisionAnalysis;
use crate::config::ModelConfig;
use crate::error::{BackendError, BackendResult};
use crate::prompts::DECISION_ANALYSIS_PROMPT;

/// A remote model able to produce a [`DecisionAnalysis`].
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Identifier reported as `model_used` when this backend answers.
    fn model_id(&self) -> &str;

    /// Run the prompt and validate the output against the analysis schema.
    async fn analyze(&self, prompt: &str) -> BackendResult<DecisionAnalysis>;
}

/// Sampling settings applied identically to every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub tool_choice: ToolChoice,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: None,
            tool_choice: ToolChoice::None,
        }
    }
}

impl From<&ModelConfig> for ModelSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            tool_choice: ToolChoice::None,
        }
    }
}

/// Chat-completions backend for a single model.
#[derive(Clone)]
pub struct ModelBackend {
    id: ModelId,
    client: ChatClient,
    settings: ModelSettings,
}

impl ModelBackend {
    pub fn new(model_id: impl Into<String>, client: ChatClient, settings: ModelSettings) -> Self {
        Self {
            id: ModelId::parse(model_id),
            client,
            settings,
        }
    }

    /// Build the completion request for a prompt.
    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.id.model_name(),
            vec![
                ChatMessage::system(DECISION_ANALYSIS_PROMPT),
                ChatMessage::user(prompt),
            ],
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
        .with_tool_choice(self.settings.tool_choice)
        .with_json_output()
    }
}

#[async_trait]
impl AnalysisBackend for ModelBackend {
    fn model_id(&self) -> &str {
        self.id.as_str()
    }

    async fn analyze(&self, prompt: &str) -> BackendResult<DecisionAnalysis> {
        let request = self.build_request(prompt);
        let response = self.client.complete(&request).await?;

        let completion = response
            .completion()
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "Response contained no completion text".to_string(),
            })?;

        debug!(
            model = %self.id,
            finish_reason = ?response.choices.first().and_then(|c| c.finish_reason.as_deref()),
            "Validating model output"
        );

        DecisionAnalysis::from_completion(completion)
    }
}

/// Build the ordered backend list: primary first, then fallback.
pub fn backends_from_config(
    models: &ModelConfig,
    client: &ChatClient,
) -> Vec<Arc<dyn AnalysisBackend>> {
    let settings = ModelSettings::from(models);
    [&models.primary, &models.fallback]
        .into_iter()
        .map(|id| {
            Arc::new(ModelBackend::new(id.clone(), client.clone(), settings.clone()))
                as Arc<dyn AnalysisBackend>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, RequestConfig};

    fn test_client() -> ChatClient {
        let config = ProviderConfig {
            api_key: "test_key".to_string(),
            base_url: "http://localhost:1".to_string(),
        };
        ChatClient::new(&config, RequestConfig::default()).unwrap()
    }

    #[test]
    fn test_build_request_uses_model_name_and_settings() {
        let backend = ModelBackend::new(
            "groq:llama-3.1-8b-instant",
            test_client(),
            ModelSettings::default(),
        );
        let req = backend.build_request("\nDecision:\nx\n");

        assert_eq!(req.model, "llama-3.1-8b-instant");
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.tool_choice, Some(ToolChoice::None));
        assert_eq!(req.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].content, DECISION_ANALYSIS_PROMPT);
        assert_eq!(req.messages[1].content, "\nDecision:\nx\n");
        assert_eq!(backend.model_id(), "groq:llama-3.1-8b-instant");
    }

    #[test]
    fn test_backends_from_config_order() {
        let models = ModelConfig {
            primary: "groq:llama-3.3-70b-versatile".to_string(),
            fallback: "groq:llama-3.1-8b-instant".to_string(),
            temperature: 0.2,
            max_tokens: Some(2000),
        };
        let backends = backends_from_config(&models, &test_client());
        let ids: Vec<&str> = backends.iter().map(|b| b.model_id()).collect();
        assert_eq!(
            ids,
            vec!["groq:llama-3.3-70b-versatile", "groq:llama-3.1-8b-instant"]
        );
    }
}
