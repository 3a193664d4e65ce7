//! Offline index build: encodes every document and writes a flat index that
//! the server loads at startup. Vectors are unit-normalized so inner
//! product search ranks by cosine similarity.
//!
//! Usage: `eagle-index [DOCUMENTS_JSON] [INDEX_JSON]`. Paths default to the
//! `corpus` section of the configuration.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};

use eagle_legal_backend::core::config::{AppPaths, ConfigService};
use eagle_legal_backend::core::logging;
use eagle_legal_backend::rag::vector_math::l2_normalize;
use eagle_legal_backend::rag::{build_encoder, DocumentStore, Encoder, FlatIndex, Metric};

const BATCH_SIZE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let settings = ConfigService::new(paths.clone())
        .load_settings()
        .context("Failed to load configuration")?;

    let mut args = env::args().skip(1);
    let documents_path = paths.resolve(
        &args
            .next()
            .unwrap_or_else(|| settings.corpus.documents_path.clone()),
    );
    let index_path = paths.resolve(
        &args
            .next()
            .unwrap_or_else(|| settings.corpus.index_path.clone()),
    );

    let store = DocumentStore::load(&documents_path)?;
    if store.is_empty() {
        bail!("{} contains no documents", documents_path.display());
    }

    let encoder = build_encoder(&settings.encoder)?;
    let mut vectors = Vec::with_capacity(store.len());
    for (batch_no, batch) in store.documents().chunks(BATCH_SIZE).enumerate() {
        let encoded = encoder
            .encode_batch(batch)
            .await
            .with_context(|| format!("Failed to encode batch {}", batch_no))?;
        for mut vector in encoded {
            l2_normalize(&mut vector);
            vectors.push(vector);
        }
        tracing::info!("Encoded {}/{} documents", vectors.len(), store.len());
    }

    let index = FlatIndex::from_vectors(Metric::InnerProduct, encoder.dimension(), vectors)?;
    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    index.save(&index_path)?;

    tracing::info!("Wrote index for {} documents to {}", store.len(), index_path.display());
    Ok(())
}
