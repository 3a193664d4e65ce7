//! Vector similarity index.
//!
//! `FlatIndex` scores every stored vector against the query. The on-disk
//! format is JSON: `{"dimension": d, "metric": "inner_product", "vectors": [[..], ..]}`
//! with vector `i` belonging to document `i`.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::error::{CorpusError, RetrievalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Dot product; equals cosine similarity for unit vectors.
    InnerProduct,
    /// Squared Euclidean distance, reported negated so higher is closer.
    L2,
}

/// Nearest-neighbor lookup over the corpus embeddings.
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` `(id, score)` pairs, most similar first. Never more than
    /// `len()` results.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, RetrievalError>;
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    metric: Metric,
    vectors: Vec<Vec<f32>>,
}

pub struct FlatIndex {
    metric: Metric,
    vectors: Array2<f32>,
    squared_norms: Array1<f32>,
}

impl FlatIndex {
    pub fn from_vectors(
        metric: Metric,
        dimension: usize,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, CorpusError> {
        if dimension == 0 {
            return Err(CorpusError::InvalidIndex(
                "dimension must be at least 1".to_string(),
            ));
        }
        if let Some((row, bad)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimension) {
            return Err(CorpusError::InvalidIndex(format!(
                "vector {} has {} dimensions, expected {}",
                row,
                bad.len(),
                dimension
            )));
        }

        let rows = vectors.len();
        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((rows, dimension), flat)
            .map_err(|e| CorpusError::InvalidIndex(e.to_string()))?;
        let squared_norms = matrix.map_axis(Axis(1), |row| row.dot(&row));

        Ok(Self {
            metric,
            vectors: matrix,
            squared_norms,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let contents = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: IndexFile =
            serde_json::from_str(&contents).map_err(|source| CorpusError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let index = Self::from_vectors(file.metric, file.dimension, file.vectors)?;
        tracing::info!(
            "Loaded {} vectors ({} dims, {:?}) from {}",
            index.len(),
            index.dimension(),
            index.metric,
            path.display()
        );
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<(), CorpusError> {
        let file = IndexFile {
            dimension: self.dimension(),
            metric: self.metric,
            vectors: self.vectors.outer_iter().map(|row| row.to_vec()).collect(),
        };
        let json = serde_json::to_string(&file).map_err(|source| CorpusError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    fn len(&self) -> usize {
        self.vectors.nrows()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, RetrievalError> {
        if query.len() != self.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query = ArrayView1::from(query);
        let dots = self.vectors.dot(&query);
        let scores: Vec<f32> = match self.metric {
            Metric::InnerProduct => dots.to_vec(),
            Metric::L2 => {
                let query_norm = query.dot(&query);
                dots.iter()
                    .zip(self.squared_norms.iter())
                    .map(|(dot, norm)| -(norm - 2.0 * dot + query_norm))
                    .collect()
            }
        };

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|left, right| {
            right
                .1
                .partial_cmp(&left.1)
                .unwrap_or(Ordering::Equal)
                .then(left.0.cmp(&right.0))
        });
        ranked.truncate(k);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(metric: Metric) -> FlatIndex {
        FlatIndex::from_vectors(
            metric,
            2,
            vec![vec![0.8, 0.2], vec![0.1, 0.9], vec![0.9, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn inner_product_ranks_highest_first() {
        let hits = sample(Metric::InnerProduct).search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 0, 1]);
        assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn l2_prefers_nearest_point() {
        let hits = sample(Metric::L2).search(&[0.1, 1.0], 2).unwrap();
        assert_eq!(hits[0].0, 1);
        assert!(hits[0].1 <= 0.0);
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn k_larger_than_corpus_is_not_padded() {
        let hits = sample(Metric::InnerProduct).search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn wrong_query_dimension_is_rejected() {
        let err = sample(Metric::InnerProduct).search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn ragged_vectors_are_rejected() {
        let result = FlatIndex::from_vectors(Metric::L2, 2, vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(CorpusError::InvalidIndex(_))));
    }

    #[test]
    fn save_then_load_preserves_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acts.index.json");
        let index = sample(Metric::InnerProduct);
        index.save(&path).unwrap();

        let loaded = FlatIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.metric(), Metric::InnerProduct);
        assert_eq!(
            loaded.search(&[1.0, 0.0], 1).unwrap()[0].0,
            index.search(&[1.0, 0.0], 1).unwrap()[0].0
        );
    }
}
