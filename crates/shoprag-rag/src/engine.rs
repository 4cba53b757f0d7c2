//! The engine object the outer layers hold on to.
//!
//! A [`RagEngine`] owns the embedder, the optional generator and the current
//! catalog snapshot. The snapshot is an immutable `Arc<CatalogIndex>`; queries
//! clone the `Arc` and work without holding the lock, and reload/rebuild
//! install a new snapshot with a single pointer swap. Rebuilds and reloads are
//! serialized by a separate build lock so the persisted pair and the installed
//! snapshot always come from the same build.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{error, info, warn};

use shoprag_core::config::Settings;
use shoprag_core::data_processor::DataProcessor;
use shoprag_core::error::{Error, Result};
use shoprag_core::traits::{Embedder, Generator};
use shoprag_core::types::ProductSuggestion;
use shoprag_vector::{build_catalog_index, CatalogIndex, IndexStore};

use crate::prompt::assemble_prompt;
use crate::retriever::{retrieve, Retrieval};
use crate::suggestions::filter_suggestions;

pub const NO_RESULTS_MESSAGE: &str =
    "I couldn't find relevant information to answer your question. Please try rephrasing or ask about specific products or materials.";
pub const NO_GENERATOR_MESSAGE: &str = "The answer generator is not available. Please check that an API key is configured.";
pub const NOT_READY_MESSAGE: &str = "The assistant is still loading the product catalog. Please try again shortly.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<ProductSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub ready: bool,
    pub chunks: usize,
    pub dim: usize,
    pub embedder_id: Option<String>,
    pub built_at: Option<DateTime<Utc>>,
    pub generator_available: bool,
}

pub struct RagEngine {
    settings: Settings,
    base_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    snapshot: RwLock<Option<Arc<CatalogIndex>>>,
    build_lock: Mutex<()>,
}

impl RagEngine {
    /// Relative paths in `settings` resolve against `base_dir`.
    pub fn new(
        settings: Settings,
        base_dir: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Self {
        Self {
            settings,
            base_dir: base_dir.as_ref().to_path_buf(),
            embedder,
            generator,
            snapshot: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    fn store(&self) -> IndexStore {
        IndexStore::new(self.settings.index_dir(&self.base_dir))
    }

    /// Load the persisted index, building and persisting it from the catalog
    /// when none exists yet. On error the engine stays not ready.
    pub fn initialize(&self) -> Result<()> {
        let store = self.store();
        match store.load() {
            Ok(catalog) if catalog.embedder_id() == self.embedder.embedder_id() => {
                self.install(catalog);
                Ok(())
            }
            Ok(catalog) => {
                warn!(
                    stored = catalog.embedder_id(),
                    current = self.embedder.embedder_id(),
                    "persisted index was built with a different embedder; rebuilding"
                );
                self.rebuild()
            }
            Err(e) if e.is_not_found() => {
                info!(dir = %store.dir().display(), "no persisted index; building from catalog");
                self.rebuild()
            }
            Err(e) => {
                error!(error = %e, dir = %store.dir().display(), "failed to load persisted index");
                Err(e)
            }
        }
    }

    /// Re-read the catalog, re-embed, persist, then swap in the new index.
    pub fn rebuild(&self) -> Result<()> {
        let _guard = self.build_lock.lock();
        let catalog = self.build_from_catalog()?;
        self.store().persist(&catalog)?;
        self.install(catalog);
        Ok(())
    }

    /// Build a fresh index from the catalog without persisting or installing it.
    pub fn build_from_catalog(&self) -> Result<CatalogIndex> {
        let path = self.settings.catalog_path(&self.base_dir);
        let chunks = DataProcessor::new().process_catalog(&path)?;
        build_catalog_index(chunks, self.embedder.as_ref(), self.settings.embedding.batch_size)
    }

    /// Swap in whatever is currently persisted.
    pub fn reload(&self) -> Result<()> {
        let _guard = self.build_lock.lock();
        let catalog = self.store().load()?;
        if catalog.embedder_id() != self.embedder.embedder_id() {
            return Err(Error::InvalidConfig(format!(
                "persisted index was built with {} but the engine uses {}",
                catalog.embedder_id(),
                self.embedder.embedder_id()
            )));
        }
        self.install(catalog);
        Ok(())
    }

    pub fn shutdown(&self) {
        if self.snapshot.write().take().is_some() {
            info!("engine shut down; index released");
        }
    }

    pub fn ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    fn install(&self, catalog: CatalogIndex) {
        let (chunks, dim) = (catalog.len(), catalog.dim());
        *self.snapshot.write() = Some(Arc::new(catalog));
        info!(chunks, dim, "engine ready");
    }

    fn current(&self) -> Option<Arc<CatalogIndex>> {
        self.snapshot.read().clone()
    }

    /// Retrieve grounding chunks for `query` against the current snapshot.
    pub fn retrieve(&self, query: &str) -> Retrieval {
        match self.current() {
            Some(catalog) => retrieve(self.embedder.as_ref(), &catalog, query, self.settings.retrieval.top_k),
            None => Retrieval::Unavailable("engine is not ready".to_string()),
        }
    }

    /// Answer a question. Every failure becomes a user-facing message.
    pub fn answer(&self, query: &str) -> Answer {
        let Some(catalog) = self.current() else {
            return Answer { answer: NOT_READY_MESSAGE.to_string() };
        };
        let Some(generator) = self.generator.as_ref() else {
            return Answer { answer: NO_GENERATOR_MESSAGE.to_string() };
        };

        let chunks = match retrieve(self.embedder.as_ref(), &catalog, query, self.settings.retrieval.top_k) {
            Retrieval::Found(chunks) if !chunks.is_empty() => chunks,
            Retrieval::Found(_) | Retrieval::Unavailable(_) => {
                return Answer { answer: NO_RESULTS_MESSAGE.to_string() };
            }
        };

        let prompt = assemble_prompt(query, &chunks);
        match generator.generate(&prompt) {
            Ok(text) => Answer { answer: text },
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "answer generation failed");
                Answer { answer: format!("Sorry, I encountered an error while generating an answer: {}", e) }
            }
        }
    }

    /// Filter the catalog by metadata. Returns no suggestions until ready.
    pub fn suggestions(&self, category: Option<&str>, max_price: Option<f64>) -> Result<Suggestions> {
        let Some(catalog) = self.current() else {
            // Bad arguments are reported even before the index is loaded.
            filter_suggestions(&[], category, max_price)?;
            return Ok(Suggestions { suggestions: Vec::new() });
        };
        let suggestions = filter_suggestions(catalog.chunks(), category, max_price)?;
        Ok(Suggestions { suggestions })
    }

    /// Distinct categories across the loaded catalog, sorted.
    pub fn categories(&self) -> BTreeSet<String> {
        self.current()
            .map(|c| c.chunks().iter().map(|ch| ch.metadata.category.clone()).collect())
            .unwrap_or_default()
    }

    pub fn status(&self) -> EngineStatus {
        let current = self.current();
        EngineStatus {
            ready: current.is_some(),
            chunks: current.as_ref().map_or(0, |c| c.len()),
            dim: current.as_ref().map_or(0, |c| c.dim()),
            embedder_id: current.as_ref().map(|c| c.embedder_id().to_string()),
            built_at: current.as_ref().map(|c| c.built_at()),
            generator_available: self.generator.is_some(),
        }
    }

    pub fn settings(&self) -> &Settings { &self.settings }
}
