use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use adwatch_core::AnomalyDetector;

use super::{DetectorStore, GetResponse, StoreContext, StoreError};

/// In-process detector store. Keeps raw JSON so lookups go through the
/// same parse path as the file store.
#[derive(Default)]
pub struct MemoryDetectorStore {
    detectors: RwLock<HashMap<String, (u64, Bytes)>>,
    lookups: AtomicUsize,
    last_context: RwLock<Option<StoreContext>>,
}

impl MemoryDetectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, bypassing serialization.
    pub fn insert_raw(&self, id: &str, source: impl Into<Bytes>) -> u64 {
        let mut guard = self.detectors.write().unwrap_or_else(|e| e.into_inner());
        let version = guard.get(id).map_or(1, |(v, _)| v + 1);
        guard.insert(id.to_string(), (version, source.into()));
        version
    }

    /// Number of `get` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Context of the most recent `get`.
    pub fn last_context(&self) -> Option<StoreContext> {
        self.last_context.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl DetectorStore for MemoryDetectorStore {
    async fn get(&self, ctx: &StoreContext, id: &str) -> Result<GetResponse, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        *self.last_context.write().unwrap_or_else(|e| e.into_inner()) = Some(ctx.clone());
        let guard = self.detectors.read().unwrap_or_else(|e| e.into_inner());
        Ok(match guard.get(id) {
            Some((version, source)) => GetResponse::found(id, source.clone(), *version),
            None => GetResponse::missing(id),
        })
    }

    async fn put(
        &self,
        _ctx: &StoreContext,
        id: &str,
        detector: &AnomalyDetector,
    ) -> Result<u64, StoreError> {
        let source = serde_json::to_vec(detector)?;
        Ok(self.insert_raw(id, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_lookups_and_context() {
        let store = MemoryDetectorStore::new();
        store.insert_raw("a", "{}");
        assert_eq!(store.insert_raw("a", "{}"), 2);

        let got = store.get(&StoreContext::System, "a").await.unwrap();
        assert_eq!(got.version, Some(2));
        assert!(!store.get(&StoreContext::System, "b").await.unwrap().exists);
        assert_eq!(store.lookups(), 2);
        assert_eq!(store.last_context(), Some(StoreContext::System));
    }
}
