use thiserror::Error;

use crate::core::errors::ApiError;
use crate::llm::LlmSetupError;
use crate::rag::{CorpusError, EncoderError};

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to load corpus: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Failed to initialize encoder: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Failed to initialize LLM client: {0}")]
    Llm(#[from] LlmSetupError),
}
