//! Text encoders producing query and document embeddings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::vector_math::l2_normalize;
use crate::core::config::{EncoderConfig, EncoderKind};

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    Malformed(String),
    #[error("expected {expected}-dimensional embeddings, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

#[async_trait]
pub trait Encoder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.encode(text).await?);
        }
        Ok(vectors)
    }
}

pub fn build_encoder(config: &EncoderConfig) -> Result<Arc<dyn Encoder>, EncoderError> {
    match config.kind {
        EncoderKind::Remote => Ok(Arc::new(RemoteEncoder::new(config)?)),
        EncoderKind::Hashing => Ok(Arc::new(HashingEncoder::new(config.dimension))),
    }
}

/// Calls an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct RemoteEncoder {
    base_url: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl RemoteEncoder {
    pub fn new(config: &EncoderConfig) -> Result<Self, EncoderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EncoderError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            client,
        })
    }
}

#[async_trait]
impl Encoder for RemoteEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EncoderError::Malformed("empty data array".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EncoderError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(EncoderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| EncoderError::Malformed(e.to_string()))?;
        let data = payload["data"]
            .as_array()
            .ok_or_else(|| EncoderError::Malformed("missing data array".to_string()))?;
        if data.len() != texts.len() {
            return Err(EncoderError::Malformed(format!(
                "{} embeddings for {} inputs",
                data.len(),
                texts.len()
            )));
        }

        let mut vectors = Vec::with_capacity(data.len());
        for item in data {
            let vector: Vec<f32> = item["embedding"]
                .as_array()
                .ok_or_else(|| EncoderError::Malformed("missing embedding".to_string()))?
                .iter()
                .filter_map(|v| v.as_f64().map(|x| x as f32))
                .collect();
            if vector.len() != self.dimension {
                return Err(EncoderError::Dimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

/// Deterministic bag-of-words encoder: each lowercased token is hashed into a
/// signed bucket. Needs no model, so it backs offline runs and tests.
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Encoder for HashingEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        Ok(self.embed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::vector_math::l2_norm;
    use crate::test_support;
    use axum::routing::post;
    use axum::{Json, Router};

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn hashing_is_deterministic_and_unit_length() {
        let encoder = HashingEncoder::new(64);
        let a = encoder.encode("Theft is punishable").await.unwrap();
        let b = encoder.encode("theft IS punishable").await.unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((l2_norm(&a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn hashing_scores_shared_words_higher() {
        let encoder = HashingEncoder::new(256);
        let query = encoder.encode("penalty for theft").await.unwrap();
        let related = encoder
            .encode("Theft is punishable by a penalty of up to 3 years.")
            .await
            .unwrap();
        let unrelated = encoder
            .encode("Marriage requires the consent of both parties.")
            .await
            .unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn remote_encoder_reads_embedding_data() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                let count = body["input"].as_array().map(Vec::len).unwrap_or(0);
                let data: Vec<Value> = (0..count)
                    .map(|i| json!({ "index": i, "embedding": [i as f32, 1.0, 0.0] }))
                    .collect();
                Json(json!({ "data": data }))
            }),
        );
        let base_url = test_support::spawn(app).await;
        let encoder = RemoteEncoder::new(&EncoderConfig {
            base_url,
            dimension: 3,
            ..EncoderConfig::default()
        })
        .unwrap();

        let vectors = encoder
            .encode_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0, 0.0], vec![1.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn remote_encoder_checks_dimension() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({ "data": [{ "embedding": [1.0, 2.0] }] })) }),
        );
        let base_url = test_support::spawn(app).await;
        let encoder = RemoteEncoder::new(&EncoderConfig {
            base_url,
            dimension: 3,
            ..EncoderConfig::default()
        })
        .unwrap();

        let err = encoder.encode("a").await.unwrap_err();
        assert!(matches!(
            err,
            EncoderError::Dimension { expected: 3, actual: 2 }
        ));
    }
}
