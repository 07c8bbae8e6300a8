//! Stored-detector lookup for previews that carry no inline detector.

use adwatch_core::AnomalyDetector;

use super::error::ExecuteError;
use crate::store::{DetectorStore, StoreContext};

/// Fetch and decode detector `id`.
///
/// The lookup always runs as [`StoreContext::System`]: preview reads
/// configuration on the caller's behalf, not with the caller's rights.
pub async fn resolve(store: &dyn DetectorStore, id: &str) -> Result<AnomalyDetector, ExecuteError> {
    let got = match store.get(&StoreContext::System, id).await {
        Ok(got) => got,
        Err(e) => {
            tracing::error!(detector_id = %id, error = %e, "Fail to get detector for preview");
            return Err(ExecuteError::Resolution(e.to_string()));
        }
    };

    let source = match (got.exists, got.source) {
        (true, Some(source)) => source,
        _ => {
            return Err(ExecuteError::NotFound(format!(
                "Can't find anomaly detector with id:{}",
                id
            )))
        }
    };

    AnomalyDetector::parse(&source, id, got.version).map_err(|e| {
        tracing::error!(detector_id = %id, error = %e, "Fail to parse detector for preview");
        ExecuteError::Resolution(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDetectorStore;
    use serde_json::json;

    #[tokio::test]
    async fn decodes_stored_detector_with_identity() {
        let store = MemoryDetectorStore::new();
        store.insert_raw(
            "det-1",
            json!({
                "name": "cpu",
                "time_field": "ts",
                "indices": ["metrics"],
                "feature_attributes": [],
                "detection_interval": { "period": { "interval": 5, "unit": "Minutes" } }
            })
            .to_string(),
        );
        let detector = resolve(&store, "det-1").await.unwrap();
        assert_eq!(detector.detector_id.as_deref(), Some("det-1"));
        assert!(detector.version.is_some());
        assert_eq!(store.last_context(), Some(StoreContext::System));
    }

    #[tokio::test]
    async fn missing_detector_names_the_id() {
        let store = MemoryDetectorStore::new();
        let err = resolve(&store, "X").await.unwrap_err();
        assert!(matches!(err, ExecuteError::NotFound(ref m) if m == "Can't find anomaly detector with id:X"));
    }

    #[tokio::test]
    async fn unreadable_detector_is_a_resolution_failure() {
        let store = MemoryDetectorStore::new();
        store.insert_raw("bad", "[1,2]".to_string());
        let err = resolve(&store, "bad").await.unwrap_err();
        assert!(matches!(err, ExecuteError::Resolution(_)));
    }
}
