use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{truncate_body, GenerationProvider, ProviderError};
use super::types::GenerationRequest;

pub const DEFAULT_OPENAI_COMPAT_BASE_URL: &str = "http://127.0.0.1:1234";

const PROVIDER_NAME: &str = "openai_compat";

/// Any server exposing `/v1/chat/completions` (LM Studio, llama.cpp, Ollama).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_COMPAT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": false,
        });
        if let (Some(obj), Some(max)) = (body.as_object_mut(), request.max_output_tokens) {
            obj.insert("max_tokens".to_string(), json!(max));
        }

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder.send().await.map_err(|e| ProviderError::Transport {
            provider: PROVIDER_NAME.to_string(),
            message: e.to_string(),
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let payload: Value = res.json().await.map_err(|e| ProviderError::Malformed {
            provider: PROVIDER_NAME.to_string(),
            message: e.to_string(),
        })?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed {
                provider: PROVIDER_NAME.to_string(),
                message: "missing choices[0].message.content".to_string(),
            })
    }
}
