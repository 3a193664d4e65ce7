//! Client for the remote answer-generation service.
//!
//! `LlmClient` wraps a `GenerationProvider` with retry on rate-limit and
//! transient-unavailable responses, a per-attempt timeout, and output
//! normalization.

pub mod client;
pub mod gemini;
pub mod normalize;
pub mod openai_compat;
pub mod provider;
pub mod retry;
pub mod types;

pub use client::{GenerationError, LlmClient, LlmSetupError};
pub use normalize::normalize_output;
pub use provider::{GenerationProvider, ProviderError};
pub use retry::RetryPolicy;
pub use types::{ChatMessage, GenerationRequest, GenerationSettings};
