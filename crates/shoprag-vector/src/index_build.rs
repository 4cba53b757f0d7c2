//! Embed chunks in batches and assemble a [`CatalogIndex`].
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use shoprag_core::error::{Error, Result};
use shoprag_core::traits::Embedder;
use shoprag_core::types::Chunk;

use crate::catalog::CatalogIndex;
use crate::index::VectorIndex;

pub fn build_catalog_index(chunks: Vec<Chunk>, embedder: &dyn Embedder, batch_size: usize) -> Result<CatalogIndex> {
    if chunks.is_empty() {
        return Err(Error::EmptyCatalog("no chunks to index".to_string()));
    }
    if batch_size == 0 {
        return Err(Error::InvalidArgument("batch_size must be at least 1".to_string()));
    }
    info!(chunks = chunks.len(), embedder = embedder.embedder_id(), batch_size, "embedding catalog chunks");

    let pb = ProgressBar::new(chunks.len() as u64);
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embs = embedder.embed_batch(&texts).map_err(|e| Error::Embedding(format!("{:#}", e)))?;
        if embs.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} texts",
                embs.len(),
                texts.len()
            )));
        }
        vectors.extend(embs);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let index = VectorIndex::build(vectors)?;
    let catalog = CatalogIndex::new(index, chunks, embedder.embedder_id(), Utc::now())?;
    info!(chunks = catalog.len(), dim = catalog.dim(), "built vector index");
    Ok(catalog)
}
