use chrono::{DateTime, Utc};

use shoprag_core::error::{Error, Result};
use shoprag_core::types::Chunk;

use crate::index::VectorIndex;

/// Vectors and the chunks they embed, kept in lockstep: vector `i` is the
/// embedding of `chunks[i].text`.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    index: VectorIndex,
    chunks: Vec<Chunk>,
    embedder_id: String,
    built_at: DateTime<Utc>,
}

impl CatalogIndex {
    pub fn new(index: VectorIndex, chunks: Vec<Chunk>, embedder_id: impl Into<String>, built_at: DateTime<Utc>) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(Error::InvalidArgument(format!(
                "index holds {} vectors but {} chunks were supplied",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks, embedder_id: embedder_id.into(), built_at })
    }

    /// Nearest chunks to `query`, closest first, paired with their squared distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(&Chunk, f32)>> {
        let hits = self.index.search(query, k)?;
        Ok(hits.into_iter().map(|(pos, dist)| (&self.chunks[pos], dist)).collect())
    }

    pub fn index(&self) -> &VectorIndex { &self.index }
    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
    pub fn dim(&self) -> usize { self.index.dim() }
    pub fn embedder_id(&self) -> &str { &self.embedder_id }
    pub fn built_at(&self) -> DateTime<Utc> { self.built_at }
}
