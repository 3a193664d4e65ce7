use std::sync::Arc;

use super::encoder::Encoder;
use super::error::RetrievalError;
use super::index::VectorIndex;
use super::store::DocumentStore;
use super::types::Document;
use super::vector_math::l2_normalize;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub id: usize,
    pub text: Document,
    pub score: f32,
}

/// Text query → documents, via encoder, index and store.
///
/// Components are optional so a partially initialized context still answers
/// with `ComponentUnavailable` instead of failing to construct.
#[derive(Clone, Default)]
pub struct Retriever {
    encoder: Option<Arc<dyn Encoder>>,
    index: Option<Arc<dyn VectorIndex>>,
    store: Option<Arc<DocumentStore>>,
}

impl Retriever {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<DocumentStore>,
    ) -> Self {
        Self {
            encoder: Some(encoder),
            index: Some(index),
            store: Some(store),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Up to `min(top_k, corpus size)` documents, closest first. No score
    /// threshold is applied.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    pub async fn retrieve_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, RetrievalError> {
        let encoder = self
            .encoder
            .as_ref()
            .ok_or(RetrievalError::ComponentUnavailable("encoder"))?;
        let index = self
            .index
            .as_ref()
            .ok_or(RetrievalError::ComponentUnavailable("vector index"))?;
        let store = self
            .store
            .as_ref()
            .ok_or(RetrievalError::ComponentUnavailable("document store"))?;
        if top_k == 0 {
            return Err(RetrievalError::InvalidTopK);
        }

        let mut query_vector = encoder.encode(query).await?;
        l2_normalize(&mut query_vector);

        let hits = index.search(&query_vector, top_k)?;
        hits.into_iter()
            .take(top_k)
            .map(|(id, score)| {
                let text = store.get(id).ok_or(RetrievalError::IdOutOfRange {
                    id,
                    len: store.len(),
                })?;
                Ok(ScoredDocument {
                    id,
                    text: text.clone(),
                    score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rag::encoder::{EncoderError, HashingEncoder};
    use crate::rag::index::{FlatIndex, Metric};
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub(crate) const CORPUS: [&str; 5] = [
        "Theft is punishable by up to 3 years imprisonment.",
        "Fraud involving public funds is punishable by a fine.",
        "A contract requires offer, acceptance and consideration.",
        "Marriage requires the consent of both parties.",
        "Imprisonment terms may be suspended for first offenders.",
    ];

    /// Hashing encoder that records every text it is asked to encode.
    pub(crate) struct RecordingEncoder {
        inner: HashingEncoder,
        pub(crate) queries: Mutex<Vec<String>>,
    }

    impl RecordingEncoder {
        pub(crate) fn new(dimension: usize) -> Self {
            Self {
                inner: HashingEncoder::new(dimension),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Encoder for RecordingEncoder {
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
            self.queries.lock().unwrap().push(text.to_string());
            self.inner.encode(text).await
        }
    }

    /// Builds a retriever over `CORPUS` with an index produced by the same
    /// hashing encoder the returned `RecordingEncoder` wraps.
    pub(crate) async fn corpus_retriever(dimension: usize) -> (Retriever, Arc<RecordingEncoder>) {
        let documents: Vec<String> = CORPUS.iter().map(|d| d.to_string()).collect();
        let vectors = HashingEncoder::new(dimension)
            .encode_batch(&documents)
            .await
            .unwrap();
        let index = FlatIndex::from_vectors(Metric::InnerProduct, dimension, vectors).unwrap();
        let encoder = Arc::new(RecordingEncoder::new(dimension));
        let retriever = Retriever::new(
            encoder.clone(),
            Arc::new(index),
            Arc::new(DocumentStore::new(documents)),
        );
        (retriever, encoder)
    }

    #[tokio::test]
    async fn returns_closest_document_first() {
        let (retriever, _) = corpus_retriever(512).await;

        let docs = retriever
            .retrieve("What is the penalty for theft?", 3)
            .await
            .unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0], CORPUS[0]);
    }

    #[tokio::test]
    async fn scores_are_non_increasing() {
        let (retriever, _) = corpus_retriever(512).await;

        let hits = retriever
            .retrieve_scored("imprisonment for theft", 5)
            .await
            .unwrap();

        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn never_returns_more_than_the_corpus() {
        let (retriever, _) = corpus_retriever(64).await;

        let docs = retriever.retrieve("contract", 50).await.unwrap();
        assert_eq!(docs.len(), CORPUS.len());
    }

    #[tokio::test]
    async fn missing_component_is_reported_before_encoding() {
        let encoder = Arc::new(RecordingEncoder::new(8));
        let retriever = Retriever::default()
            .with_encoder(encoder.clone())
            .with_store(Arc::new(DocumentStore::new(vec!["x".to_string()])));

        let err = retriever.retrieve("theft", 1).await.unwrap_err();

        assert!(matches!(
            err,
            RetrievalError::ComponentUnavailable("vector index")
        ));
        assert_eq!(encoder.calls(), 0);
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let (retriever, encoder) = corpus_retriever(64).await;
        assert!(matches!(
            retriever.retrieve("theft", 0).await,
            Err(RetrievalError::InvalidTopK)
        ));
        assert_eq!(encoder.calls(), 0);
    }

    #[tokio::test]
    async fn index_ids_beyond_store_are_errors() {
        let index = FlatIndex::from_vectors(Metric::InnerProduct, 2, vec![vec![1.0, 0.0]; 3])
            .unwrap();
        let retriever = Retriever::new(
            Arc::new(HashingEncoder::new(2)),
            Arc::new(index),
            Arc::new(DocumentStore::new(vec!["only".to_string()])),
        );

        let err = retriever.retrieve("anything", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::IdOutOfRange { len: 1, .. }));
    }
}
