use tracing::{debug, warn};

use shoprag_core::traits::Embedder;
use shoprag_core::types::Chunk;
use shoprag_vector::CatalogIndex;

/// Outcome of a retrieval. `Unavailable` means the embedder or index could
/// not serve the query; callers treat it the same as an empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Found(Vec<Chunk>),
    Unavailable(String),
}

impl Retrieval {
    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            Retrieval::Found(chunks) => chunks,
            Retrieval::Unavailable(_) => Vec::new(),
        }
    }
}

/// Embed `query` and return up to `top_k` nearest chunks, closest first.
/// An empty query is embedded like any other text.
pub fn retrieve(embedder: &dyn Embedder, catalog: &CatalogIndex, query: &str, top_k: usize) -> Retrieval {
    let query_vec = match embedder.embed_batch(&[query.to_string()]) {
        Ok(mut vecs) if vecs.len() == 1 => vecs.remove(0),
        Ok(vecs) => {
            let reason = format!("embedder returned {} vectors for one query", vecs.len());
            warn!(reason = %reason, "retrieval unavailable");
            return Retrieval::Unavailable(reason);
        }
        Err(e) => {
            warn!(error = %e, "query embedding failed");
            return Retrieval::Unavailable(format!("embedding failed: {}", e));
        }
    };

    match catalog.search(&query_vec, top_k) {
        Ok(hits) => {
            debug!(top_k, hits = hits.len(), best = ?hits.first().map(|h| h.1), "retrieved chunks");
            Retrieval::Found(hits.into_iter().map(|(chunk, _)| chunk.clone()).collect())
        }
        Err(e) => {
            warn!(error = %e, "vector search failed");
            Retrieval::Unavailable(e.to_string())
        }
    }
}

/// List form of [`retrieve`]: failures become an empty list.
pub fn retrieve_chunks(embedder: &dyn Embedder, catalog: &CatalogIndex, query: &str, top_k: usize) -> Vec<Chunk> {
    retrieve(embedder, catalog, query, top_k).into_chunks()
}
