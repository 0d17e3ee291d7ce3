//! Flat inner-product index over unit vectors.
//!
//! Exact search by design: the corpus per tenant is small, recall must be
//! 100%, and a flat scan keeps the artifact trivially serializable. Cosine
//! similarity equals the dot product because every stored and queried vector
//! is unit-normalized before it reaches this type.

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Dense index of unit vectors addressed by row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index. The dimension is fixed by the first append.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Indexed dimension; 0 while the index is empty.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append a unit vector, returning its assigned row.
    pub fn append(&mut self, vector: Vec<f32>) -> Result<usize, StoreError> {
        if self.vectors.is_empty() {
            self.dimension = vector.len();
        } else if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Borrow a stored row.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        self.vectors.get(row).map(Vec::as_slice)
    }

    /// Inner-product score of `query` against every row, in row order.
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>, StoreError> {
        if !self.vectors.is_empty() && query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        Ok(self
            .vectors
            .iter()
            .map(|row| dot(query, row))
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
