/// Errors produced while executing a detector.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Detector configuration the engine cannot run (bad interval, unknown aggregation).
    #[error("Invalid detector: {0}")]
    InvalidDetector(String),

    #[error("Detector has no enabled features")]
    NoEnabledFeatures,

    #[error("Execution window is shorter than one detection interval")]
    WindowTooShort,

    #[error("Execution window spans {buckets} intervals, limit is {limit}")]
    TooManyBuckets { buckets: usize, limit: usize },

    #[error("Unsupported filter query: {0}")]
    UnsupportedFilter(String),

    /// Filesystem I/O error while reading a feature source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feature source failed: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
