use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{truncate_body, GenerationProvider, ProviderError};
use super::types::GenerationRequest;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER_NAME: &str = "gemini";

/// Google Generative Language API (`models/{model}:generateContent`).
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(base_url: Option<String>, model: String, api_key: String) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini has no "system" or "assistant" roles inside `contents`: system
/// messages become `systemInstruction`, assistant turns become `model`.
fn build_body(request: &GenerationRequest) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in &request.messages {
        match message.role.as_str() {
            "system" => system_parts.push(json!({ "text": message.content })),
            "assistant" | "model" => contents.push(json!({
                "role": "model",
                "parts": [{ "text": message.content }]
            })),
            _ => contents.push(json!({
                "role": "user",
                "parts": [{ "text": message.content }]
            })),
        }
    }

    let mut generation_config = json!({ "temperature": request.temperature });
    if let (Some(obj), Some(max)) = (generation_config.as_object_mut(), request.max_output_tokens) {
        obj.insert("maxOutputTokens".to_string(), json!(max));
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });
    if !system_parts.is_empty() {
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "systemInstruction".to_string(),
                json!({ "parts": system_parts }),
            );
        }
    }
    body
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(ProviderError::Malformed {
            provider: PROVIDER_NAME.to_string(),
            message: reason,
        });
    }

    Ok(text)
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
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

        let payload: GenerateContentResponse =
            res.json().await.map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_NAME.to_string(),
                message: e.to_string(),
            })?;

        extract_text(payload)
    }
}
