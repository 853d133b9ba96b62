use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::config::{ProviderConfig, RequestConfig};
use crate::error::{BackendError, BackendResult};

/// Client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: &ProviderConfig, request_config: RequestConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Send one completion request. No retries happen here; the requester
    /// decides what to do with a failure.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> BackendResult<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let start = Instant::now();

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat completions"
        );

        match self.execute_request(&url, request).await {
            Ok(response) => {
                info!(
                    model = %request.model,
                    latency_ms = start.elapsed().as_millis(),
                    total_tokens = ?response.usage.as_ref().and_then(|u| u.total_tokens),
                    "Chat completion succeeded"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    model = %request.model,
                    error = %e,
                    latency_ms = start.elapsed().as_millis(),
                    "Chat completion failed"
                );
                Err(e)
            }
        }
    }

    async fn execute_request(
        &self,
        url: &str,
        request: &ChatCompletionRequest,
    ) -> BackendResult<ChatCompletionResponse> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.map_send_error(e)
                } else {
                    BackendError::InvalidResponse {
                        message: format!("Failed to parse response: {}", e),
                    }
                }
            })
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                timeout_ms: self.request_config.timeout_ms,
            }
        } else {
            BackendError::Http(e)
        }
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
