//! On-disk persistence for a [`CatalogIndex`].
//!
//! A store directory holds two files that are only meaningful together:
//! - `chunks.json`: the ordered chunk list (text plus product metadata)
//! - `vectors.idx`: a bincode blob with the vectors and a header recording the
//!   embedder id, dimension, count and the blake3 digest of `chunks.json`
//!
//! Each file is replaced atomically. `chunks.json` is written first, so a
//! crash between the two writes leaves a digest mismatch that `load` reports
//! as corruption rather than a silently misaligned index.
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shoprag_core::error::{Error, Result};
use shoprag_core::types::Chunk;

use crate::catalog::CatalogIndex;
use crate::index::VectorIndex;

pub const VECTORS_FILE: &str = "vectors.idx";
pub const CHUNKS_FILE: &str = "chunks.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexBlob {
    format_version: u32,
    embedder_id: String,
    dim: usize,
    count: usize,
    chunks_digest: String,
    built_at: DateTime<Utc>,
    index: VectorIndex,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn vectors_path(&self) -> PathBuf { self.dir.join(VECTORS_FILE) }
    fn chunks_path(&self) -> PathBuf { self.dir.join(CHUNKS_FILE) }

    pub fn persist(&self, catalog: &CatalogIndex) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let chunk_bytes = serde_json::to_vec_pretty(catalog.chunks())
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        let blob = IndexBlob {
            format_version: FORMAT_VERSION,
            embedder_id: catalog.embedder_id().to_string(),
            dim: catalog.dim(),
            count: catalog.len(),
            chunks_digest: blake3::hash(&chunk_bytes).to_hex().to_string(),
            built_at: catalog.built_at(),
            index: catalog.index().clone(),
        };
        let blob_bytes = bincode::serialize(&blob)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;

        write_atomic(&self.chunks_path(), &chunk_bytes)?;
        write_atomic(&self.vectors_path(), &blob_bytes)?;
        info!(dir = %self.dir.display(), chunks = blob.count, dim = blob.dim, "persisted index");
        Ok(())
    }

    pub fn load(&self) -> Result<CatalogIndex> {
        let (vectors_path, chunks_path) = (self.vectors_path(), self.chunks_path());
        match (vectors_path.is_file(), chunks_path.is_file()) {
            (false, false) => {
                return Err(Error::NotFound(format!("no persisted index in {}", self.dir.display())));
            }
            (true, false) => return Err(corrupt(format!("{} is missing", chunks_path.display()))),
            (false, true) => return Err(corrupt(format!("{} is missing", vectors_path.display()))),
            (true, true) => {}
        }

        let blob_bytes = std::fs::read(&vectors_path).map_err(|e| corrupt(format!("reading {}: {}", vectors_path.display(), e)))?;
        let chunk_bytes = std::fs::read(&chunks_path).map_err(|e| corrupt(format!("reading {}: {}", chunks_path.display(), e)))?;

        let blob: IndexBlob = bincode::deserialize(&blob_bytes)
            .map_err(|e| corrupt(format!("decoding {}: {}", vectors_path.display(), e)))?;
        if blob.format_version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", blob.format_version)));
        }
        let digest = blake3::hash(&chunk_bytes).to_hex().to_string();
        if digest != blob.chunks_digest {
            return Err(corrupt(format!("{} does not match the vectors it was saved with", CHUNKS_FILE)));
        }
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunk_bytes)
            .map_err(|e| corrupt(format!("decoding {}: {}", chunks_path.display(), e)))?;

        blob.index.validate()?;
        if blob.index.len() != blob.count || chunks.len() != blob.count {
            return Err(corrupt(format!(
                "count mismatch: header {}, vectors {}, chunks {}",
                blob.count,
                blob.index.len(),
                chunks.len()
            )));
        }
        if blob.count > 0 && blob.index.dim() != blob.dim {
            return Err(corrupt(format!("header dimension {} but vectors have {}", blob.dim, blob.index.dim())));
        }

        let catalog = CatalogIndex::new(blob.index, chunks, blob.embedder_id, blob.built_at)?;
        info!(dir = %self.dir.display(), chunks = catalog.len(), dim = catalog.dim(), embedder = catalog.embedder_id(), "loaded index");
        Ok(catalog)
    }
}

fn corrupt(msg: String) -> Error {
    Error::CorruptIndex(msg)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, format!("writing {}: {}", path.display(), e))))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}
