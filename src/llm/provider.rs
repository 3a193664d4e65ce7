use async_trait::async_trait;
use thiserror::Error;

use super::types::GenerationRequest;

/// HTTP statuses the remote service uses for rate limiting and transient
/// unavailability.
pub const RETRIABLE_STATUSES: [u16; 2] = [429, 503];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("request to {provider} failed: {message}")]
    Transport { provider: String, message: String },
    #[error("malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },
    #[error("{provider} did not answer within {secs}s")]
    Timeout { provider: String, secs: u64 },
}

impl ProviderError {
    /// Only rate-limit and transient-unavailable responses are worth retrying.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ProviderError::Status { status, .. } if RETRIABLE_STATUSES.contains(status))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logs (e.g. "gemini", "openai_compat").
    fn name(&self) -> &str;

    /// Sends one request and returns the raw, unnormalized text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

/// Truncates an error body so a verbose HTML error page does not flood logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 500;
    if body.chars().count() <= MAX_CHARS {
        return body.trim().to_string();
    }
    let truncated: String = body.chars().take(MAX_CHARS).collect();
    format!("{}…", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ProviderError {
        ProviderError::Status {
            provider: "test".to_string(),
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn only_429_and_503_are_retriable() {
        assert!(status(429).is_retriable());
        assert!(status(503).is_retriable());
        assert!(!status(500).is_retriable());
        assert!(!status(400).is_retriable());
        assert!(!ProviderError::Timeout {
            provider: "test".to_string(),
            secs: 1
        }
        .is_retriable());
        assert!(!ProviderError::Transport {
            provider: "test".to_string(),
            message: "connection refused".to_string()
        }
        .is_retriable());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let truncated = truncate_body(&body);
        assert!(truncated.chars().count() <= 501);
        assert_eq!(truncate_body("  short  "), "short");
    }
}
