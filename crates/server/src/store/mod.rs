//! Detector persistence: point lookup by id with a version marker.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileDetectorStore;
pub use memory::MemoryDetectorStore;

use async_trait::async_trait;
use bytes::Bytes;

use adwatch_core::AnomalyDetector;

/// Authority a store call runs under.
///
/// Every lookup made on behalf of a request runs as `System`; the caller's
/// own identity never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreContext {
    System,
}

/// Result of a point lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResponse {
    pub id: String,
    pub exists: bool,
    /// Raw stored document, present when `exists`.
    pub source: Option<Bytes>,
    pub version: Option<u64>,
}

impl GetResponse {
    pub fn missing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            exists: false,
            source: None,
            version: None,
        }
    }

    pub fn found(id: &str, source: Bytes, version: u64) -> Self {
        Self {
            id: id.to_string(),
            exists: true,
            source: Some(source),
            version: Some(version),
        }
    }
}

#[async_trait]
pub trait DetectorStore: Send + Sync {
    async fn get(&self, ctx: &StoreContext, id: &str) -> Result<GetResponse, StoreError>;

    /// Store `detector` under `id`, returning the new version.
    async fn put(
        &self,
        ctx: &StoreContext,
        id: &str,
        detector: &AnomalyDetector,
    ) -> Result<u64, StoreError>;
}
