//! Retrieval-augmented generation over a fixed legal corpus.
//!
//! - `DocumentStore`: id-addressable document texts
//! - `FlatIndex`: exact nearest-neighbour search over precomputed vectors
//! - `Retriever`: encode, normalize, search, map ids back to text
//! - `MultiHopOrchestrator`: iterative query expansion and final generation

pub mod encoder;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod store;
pub mod types;
pub mod vector_math;

pub use encoder::{build_encoder, Encoder, EncoderError, HashingEncoder, RemoteEncoder};
pub use error::{CorpusError, RetrievalError};
pub use index::{FlatIndex, Metric, VectorIndex};
pub use orchestrator::MultiHopOrchestrator;
pub use prompt::build_prompt;
pub use retriever::{Retriever, ScoredDocument};
pub use store::DocumentStore;
pub use types::{Document, HopState, RagResult, ERROR_SENTINEL};
