//! Typed view of the merged YAML configuration.
//!
//! Every section has serde defaults so a missing `config.yml` still yields a
//! usable configuration; only the LLM credential has no default.

use serde::{Deserialize, Serialize};

use crate::llm::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub encoder: EncoderConfig,
    pub llm: LlmConfig,
    pub retry: RetryPolicy,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// The port to bind: a valid `PORT` override wins over `server.port`.
    pub fn effective_port(&self, override_value: Option<&str>) -> u16 {
        let Some(raw) = override_value else {
            return self.port;
        };
        match raw.trim().parse::<u16>() {
            Ok(port) => port,
            Err(err) => {
                tracing::warn!(
                    "Ignoring PORT={:?} ({}); using server.port {}",
                    raw,
                    err,
                    self.port
                );
                self.port
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON array of document strings.
    pub documents_path: String,
    /// Flat vector index aligned with `documents_path`.
    pub index_path: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            documents_path: "assets/acts.json".to_string(),
            index_path: "assets/acts.index.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    Remote,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub kind: EncoderKind,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub request_timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            kind: EncoderKind::Remote,
            base_url: "http://127.0.0.1:8090".to_string(),
            model: "all-mpnet-base-v2".to_string(),
            dimension: 768,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    Gemini,
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub model: String,
    /// Usually supplied through `secrets.yml`.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set.
    pub api_key_env: String,
    pub temperature: f64,
    pub max_output_tokens: Option<u32>,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            base_url: None,
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            temperature: 0.0,
            max_output_tokens: None,
            request_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// The credential from the secrets file, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub num_hops: usize,
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub max_hops: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_hops: 2,
            default_top_k: 5,
            max_top_k: 50,
            max_hops: 5,
        }
    }
}
