pub mod catalog;
pub mod index;
pub mod index_build;
pub mod store;

pub use catalog::CatalogIndex;
pub use index::VectorIndex;
pub use index_build::build_catalog_index;
pub use store::IndexStore;
