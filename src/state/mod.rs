use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::llm::LlmClient;
use crate::rag::{
    build_encoder, CorpusError, DocumentStore, Encoder, FlatIndex, MultiHopOrchestrator,
    Retriever, VectorIndex,
};

pub mod error;

use error::InitializationError;

/// Read-only context shared by every request.
///
/// Built once at startup; nothing in it is mutated afterwards, so handlers
/// only need an `Arc` and never a lock.
pub struct AppState {
    pub settings: AppConfig,
    pub store: Arc<DocumentStore>,
    pub index: Arc<FlatIndex>,
    pub orchestrator: MultiHopOrchestrator,
}

impl AppState {
    /// Loads configuration, the document store and the vector index, then
    /// wires the encoder and LLM client into an orchestrator.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(InitializationError::Config)?;

        let documents_path = paths.resolve(&settings.corpus.documents_path);
        let store = DocumentStore::load(&documents_path)?;
        let index = FlatIndex::load(&paths.resolve(&settings.corpus.index_path))?;
        let encoder = build_encoder(&settings.encoder)?;
        let llm = LlmClient::from_config(&settings.llm, settings.retry.clone())?;

        tracing::info!(
            documents = store.len(),
            dimension = index.dimension(),
            provider = llm.provider_name(),
            "Loaded corpus from {}",
            documents_path.display()
        );

        Self::from_parts(settings, store, index, encoder, llm)
    }

    /// Assembles the state from already-loaded parts, rejecting an index that
    /// does not line up with the store or the encoder.
    pub fn from_parts(
        settings: AppConfig,
        store: DocumentStore,
        index: FlatIndex,
        encoder: Arc<dyn Encoder>,
        llm: LlmClient,
    ) -> Result<Arc<Self>, InitializationError> {
        if index.len() != store.len() {
            return Err(CorpusError::Misaligned {
                documents: store.len(),
                vectors: index.len(),
            }
            .into());
        }
        if encoder.dimension() != index.dimension() {
            return Err(CorpusError::DimensionMismatch {
                encoder: encoder.dimension(),
                index: index.dimension(),
            }
            .into());
        }

        let store = Arc::new(store);
        let index = Arc::new(index);
        let retriever = Retriever::new(encoder, index.clone(), store.clone());

        Ok(Arc::new(AppState {
            settings,
            store,
            index,
            orchestrator: MultiHopOrchestrator::new(retriever, llm),
        }))
    }
}
