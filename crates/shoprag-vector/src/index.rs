//! Exact nearest-neighbour index over dense vectors.
//!
//! Vectors are stored row-major in one flat buffer. Search is exhaustive
//! squared-L2 with ties broken by insertion order, so results are fully
//! deterministic for a given index and query.
use serde::{Deserialize, Serialize};

use shoprag_core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dim: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index; the first vector fixes the dimension.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dim == 0 {
            return Err(Error::InvalidArgument("vectors must have at least one component".to_string()));
        }
        let mut data = Vec::with_capacity(dim * vectors.len());
        for (position, v) in vectors.into_iter().enumerate() {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { position, expected: dim, actual: v.len() });
            }
            data.extend(v);
        }
        Ok(Self { dim, data })
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Vector width; 0 for an index built from no vectors.
    pub fn dim(&self) -> usize { self.dim }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        Some(&self.data[position * self.dim..(position + 1) * self.dim])
    }

    /// The `k` nearest stored vectors as `(position, squared distance)`,
    /// closest first. Asking for more than are stored returns all of them.
    /// A query of the wrong width reports position 0.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { position: 0, expected: self.dim, actual: query.len() });
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument("query contains non-finite values".to_string()));
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();
        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Structural check for an index read back from disk.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            if self.data.is_empty() {
                return Ok(());
            }
            return Err(Error::CorruptIndex("zero dimension with stored values".to_string()));
        }
        if self.data.len() % self.dim != 0 {
            return Err(Error::CorruptIndex(format!(
                "{} values is not a multiple of dimension {}",
                self.data.len(),
                self.dim
            )));
        }
        if let Some(i) = self.data.iter().position(|x| !x.is_finite()) {
            return Err(Error::CorruptIndex(format!("non-finite value in vector {}", i / self.dim)));
        }
        Ok(())
    }
}

#[inline]
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
