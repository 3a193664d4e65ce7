use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::gemini::GeminiProvider;
use super::normalize::normalize_output;
use super::openai_compat::OpenAiCompatProvider;
use super::provider::{GenerationProvider, ProviderError};
use super::retry::{retry_async, RetryPolicy};
use super::types::{ChatMessage, GenerationRequest, GenerationSettings};
use crate::core::config::{LlmConfig, LlmProviderKind};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    NonRetriable(#[source] ProviderError),
    #[error("generation failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
    #[error("generation timed out after {0}s")]
    Timeout(u64),
    #[error("generation returned an empty answer")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum LlmSetupError {
    #[error("no API key for {provider}: set llm.api_key in secrets.yml or ${env}")]
    MissingCredential { provider: String, env: String },
}

/// Stateless client for the remote generation service.
///
/// Each `generate` call is one self-contained request, so the client can be
/// shared by concurrent requests without leaking conversation context.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn GenerationProvider>,
    retry: RetryPolicy,
    settings: GenerationSettings,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        retry: RetryPolicy,
        settings: GenerationSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            retry,
            settings,
            timeout,
        }
    }

    pub fn from_config(config: &LlmConfig, retry: RetryPolicy) -> Result<Self, LlmSetupError> {
        let provider: Arc<dyn GenerationProvider> = match config.provider {
            LlmProviderKind::Gemini => {
                let api_key =
                    config
                        .resolve_api_key()
                        .ok_or_else(|| LlmSetupError::MissingCredential {
                            provider: "gemini".to_string(),
                            env: config.api_key_env.clone(),
                        })?;
                Arc::new(GeminiProvider::new(
                    config.base_url.clone(),
                    config.model.clone(),
                    api_key,
                ))
            }
            LlmProviderKind::OpenaiCompat => Arc::new(OpenAiCompatProvider::new(
                config.base_url.clone(),
                config.model.clone(),
                config.resolve_api_key(),
            )),
        };

        let settings = GenerationSettings {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        };

        Ok(Self::new(
            provider,
            retry,
            settings,
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Sends `prompt` as a single user turn and returns the normalized answer.
    ///
    /// 429/503 responses are retried under the configured policy; every other
    /// failure is returned at once. Failures are logged here.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(vec![ChatMessage::user(prompt)])
            .with_settings(&self.settings);
        let provider_name = self.provider.name().to_string();
        let label = format!("{} generate", provider_name);

        let result = retry_async(&self.retry, &label, ProviderError::is_retriable, |_| {
            self.attempt(&request)
        })
        .await;

        let raw = match result {
            Ok(raw) => raw,
            Err(failure) => {
                let err = match failure.error {
                    ProviderError::Timeout { secs, .. } => GenerationError::Timeout(secs),
                    error if failure.exhausted => GenerationError::Exhausted {
                        attempts: failure.attempts,
                        source: error,
                    },
                    error => GenerationError::NonRetriable(error),
                };
                tracing::error!(provider = %provider_name, "LLM call failed: {}", err);
                return Err(err);
            }
        };

        let answer = normalize_output(&raw);
        if answer.is_empty() {
            tracing::error!(provider = %provider_name, "LLM returned an empty answer");
            return Err(GenerationError::EmptyResponse);
        }
        Ok(answer)
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.timeout, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: self.provider.name().to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
