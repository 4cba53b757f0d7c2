//! Retrieval-augmented answering over the product catalog.
pub mod engine;
pub mod generator;
pub mod prompt;
pub mod retriever;
pub mod suggestions;

pub use engine::{Answer, EngineStatus, RagEngine, Suggestions};
pub use generator::{GeminiGenerator, RetryingGenerator};
pub use retriever::Retrieval;
