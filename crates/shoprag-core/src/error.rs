use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog is empty: {0}")]
    EmptyCatalog(String),

    #[error("Dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch { position: usize, expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Errors that mean "there is no usable persisted index yet" as opposed to
    /// "there is one and it is broken".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Why a call to the external generative model did not produce text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("the generation service is rate limiting requests: {0}")]
    RateLimited(String),

    #[error("the generation service rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("the generation request timed out")]
    Timeout,

    #[error("network failure while contacting the generation service: {0}")]
    Network(String),

    #[error("the generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("the generation service returned an unexpected response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::RateLimited(_) | GenerationError::Timeout | GenerationError::Network(_) => true,
            GenerationError::Api { status, .. } => *status >= 500,
            GenerationError::Unauthorized(_) | GenerationError::MalformedResponse(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
