use std::path::PathBuf;

use thiserror::Error;

use super::encoder::EncoderError;

/// Problems with the persisted corpus; all of them are fatal at startup.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid index: {0}")]
    InvalidIndex(String),
    #[error("index holds {vectors} vectors but the document store holds {documents} documents")]
    Misaligned { documents: usize, vectors: usize },
    #[error("encoder produces {encoder}-dimensional vectors but the index was built with {index}")]
    DimensionMismatch { encoder: usize, index: usize },
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{0} is not available")]
    ComponentUnavailable(&'static str),
    #[error("top_k must be at least 1")]
    InvalidTopK,
    #[error("query encoding failed: {0}")]
    Encoding(#[from] EncoderError),
    #[error("query vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index returned id {id} outside a store of {len} documents")]
    IdOutOfRange { id: usize, len: usize },
}
