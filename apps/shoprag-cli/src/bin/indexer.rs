use std::env;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use shoprag_cli::{build_engine, init_tracing, load_settings};
use shoprag_vector::IndexStore;

/// Build the product index from the catalog and persist it.
#[derive(Parser, Debug)]
#[command(name = "shoprag-indexer")]
struct Args {
    /// Catalog CSV (overrides data.catalog_path)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output directory (overrides data.index_dir)
    #[arg(long)]
    index_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(path) = args.catalog {
        settings.data.catalog_path = path.display().to_string();
    }
    if let Some(dir) = args.index_dir {
        settings.data.index_dir = dir.display().to_string();
    }

    let base = env::current_dir()?;
    let index_dir = settings.index_dir(&base);
    let engine = build_engine(settings, &base, false)?;
    let catalog = engine.build_from_catalog()?;
    IndexStore::new(&index_dir).persist(&catalog)?;
    info!(chunks = catalog.len(), dim = catalog.dim(), dir = %index_dir.display(), "index written");
    println!("Indexed {} products into {}", catalog.len(), index_dir.display());
    Ok(())
}
