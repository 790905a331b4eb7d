//! Flat similarity index.
//!
//! Exact nearest-neighbor search by brute force: every query computes the
//! squared Euclidean distance to all stored vectors and returns the k
//! smallest. The vector set changes with every request, so the index is
//! built fresh per retrieval cycle, queried once, and dropped — there is
//! no persistence and nothing to invalidate. At single-digit to
//! low-double-digit vector counts per query, a scan beats any approximate
//! structure.

use grounder_core::{AppError, AppResult};
use std::cmp::Ordering;

/// In-memory exact nearest-neighbor index over fixed-dimension vectors.
#[derive(Debug)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index from a set of vectors.
    ///
    /// The dimension is taken from the first vector; a vector of any other
    /// dimension is an invariant violation and fails fast.
    pub fn build(vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        let first = vectors
            .first()
            .ok_or_else(|| AppError::Embedding("Cannot build index from no vectors".to_string()))?;
        let dimensions = first.len();

        if dimensions == 0 {
            return Err(AppError::Embedding(
                "Cannot build index from zero-dimension vectors".to_string(),
            ));
        }

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "Inconsistent embedding dimensions: vector {} has {}, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
        }

        Ok(Self {
            dimensions,
            vectors,
        })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index is empty (never true for a built index).
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension of the stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return the `k` nearest stored vectors to `query`.
    ///
    /// Results are `(original index, squared L2 distance)` pairs ordered by
    /// ascending distance, ties broken by lower original index. Requesting
    /// more neighbors than stored vectors returns all of them.
    pub fn query(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k.min(self.vectors.len()));

        Ok(scored)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_orders_by_distance() {
        let index = FlatIndex::build(vec![
            vec![10.0, 0.0],
            vec![1.0, 0.0],
            vec![3.0, 0.0],
        ])
        .unwrap();

        let hits = index.query(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(hits[0].1 < hits[1].1 && hits[1].1 < hits[2].1);
    }

    #[test]
    fn test_query_distance_is_squared() {
        let index = FlatIndex::build(vec![vec![3.0, 4.0]]).unwrap();
        let hits = index.query(&[0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].1, 25.0);
    }

    #[test]
    fn test_ties_broken_by_original_index() {
        let index = FlatIndex::build(vec![
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
            vec![0.0, 1.0],
        ])
        .unwrap();

        // All three are at distance 1 from the origin
        let hits = index.query(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = FlatIndex::build(vec![vec![1.0], vec![2.0]]).unwrap();
        let hits = index.query(&[0.0], 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_build_rejects_mismatched_dimensions() {
        let result = FlatIndex::build(vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]);
        match result {
            Err(e) => assert!(e.to_string().contains("Inconsistent embedding dimensions")),
            Ok(_) => panic!("Expected dimension mismatch to fail"),
        }
    }

    #[test]
    fn test_build_rejects_empty_set() {
        assert!(FlatIndex::build(Vec::new()).is_err());
    }

    #[test]
    fn test_query_rejects_wrong_dimension() {
        let index = FlatIndex::build(vec![vec![1.0, 2.0]]).unwrap();
        assert!(index.query(&[1.0], 1).is_err());
    }

    #[test]
    fn test_query_is_idempotent() {
        let index = FlatIndex::build(vec![
            vec![0.2, 0.9],
            vec![0.8, 0.1],
            vec![0.5, 0.5],
        ])
        .unwrap();

        let first = index.query(&[0.6, 0.4], 2).unwrap();
        let second = index.query(&[0.6, 0.4], 2).unwrap();
        assert_eq!(first, second);
    }
}
