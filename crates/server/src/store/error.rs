use thiserror::Error;

/// Errors produced by [`DetectorStore`](super::DetectorStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid detector id '{0}'")]
    InvalidId(String),
    #[error("Store task failed: {0}")]
    Task(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Ids map 1:1 onto file names, so only a conservative alphabet is allowed.
pub(super) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
