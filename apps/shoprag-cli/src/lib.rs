//! Shared start-up for the command-line binaries.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use shoprag_core::config::{Config, Settings};
use shoprag_core::traits::Embedder;
use shoprag_embed::get_default_embedder;
use shoprag_rag::generator::generator_from_settings;
use shoprag_rag::RagEngine;

/// Log to stderr so answers on stdout stay clean. `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub fn load_settings() -> Result<Settings> {
    let config = Config::load().context("loading configuration")?;
    Ok(config.settings()?)
}

/// Wire the embedder and generator into an engine rooted at `base_dir`.
/// The engine is returned uninitialized.
pub fn build_engine(settings: Settings, base_dir: &Path, with_generator: bool) -> Result<RagEngine> {
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let generator = if with_generator { generator_from_settings(&settings.generation)? } else { None };
    Ok(RagEngine::new(settings, base_dir, embedder, generator))
}
