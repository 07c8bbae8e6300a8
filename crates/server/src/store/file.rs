use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use adwatch_core::AnomalyDetector;

use super::error::is_valid_id;
use super::{DetectorStore, GetResponse, StoreContext, StoreError};

/// On-disk envelope around a stored detector.
#[derive(Debug, Serialize, Deserialize)]
struct StoredDetector {
    version: u64,
    source: serde_json::Value,
}

/// Filesystem-backed detector store.
///
/// ```text
/// detectors/
///   {detector_id}.json   <- { "version": n, "source": { ...detector... } }
/// ```
pub struct FileDetectorStore {
    base_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileDetectorStore {
    /// Create a store, ensuring the directory exists.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }
}

fn read_envelope(path: &Path) -> Result<Option<StoredDetector>, StoreError> {
    match std::fs::read(path) {
        Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl DetectorStore for FileDetectorStore {
    async fn get(&self, ctx: &StoreContext, id: &str) -> Result<GetResponse, StoreError> {
        if !is_valid_id(id) {
            return Ok(GetResponse::missing(id));
        }
        tracing::debug!(detector_id = %id, ?ctx, "Detector lookup");
        let path = self.path_for(id);
        let envelope = tokio::task::spawn_blocking(move || read_envelope(&path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;

        match envelope {
            Some(stored) => {
                let source = serde_json::to_vec(&stored.source)?;
                Ok(GetResponse::found(id, Bytes::from(source), stored.version))
            }
            None => Ok(GetResponse::missing(id)),
        }
    }

    async fn put(
        &self,
        ctx: &StoreContext,
        id: &str,
        detector: &AnomalyDetector,
    ) -> Result<u64, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        tracing::debug!(detector_id = %id, ?ctx, "Detector write");
        let path = self.path_for(id);
        let mut source = serde_json::to_value(detector)?;
        if let Some(map) = source.as_object_mut() {
            // Id and version live in the envelope and file name.
            map.remove("detector_id");
            map.remove("version");
        }
        let lock = Arc::clone(&self.write_lock);

        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let _guard = lock.lock().map_err(|_| StoreError::Task("write lock poisoned".into()))?;
            let version = read_envelope(&path)?.map_or(1, |s| s.version + 1);
            let json = serde_json::to_vec_pretty(&StoredDetector { version, source })?;
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, json)?;
            std::fs::rename(&tmp, &path)?;
            Ok(version)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::{Feature, IntervalConfig};
    use serde_json::json;

    fn detector() -> AnomalyDetector {
        AnomalyDetector {
            detector_id: Some("ignored".into()),
            version: Some(99),
            name: "cpu".into(),
            description: None,
            time_field: "ts".into(),
            indices: vec!["metrics".into()],
            feature_attributes: vec![Feature {
                feature_id: None,
                feature_name: "avg_cpu".into(),
                feature_enabled: true,
                aggregation_query: json!({ "avg_cpu": { "avg": { "field": "cpu" } } }),
            }],
            filter_query: None,
            detection_interval: IntervalConfig::minutes(10),
            window_delay: None,
            shingle_size: 8,
            schema_version: 0,
            last_update_time: None,
        }
    }

    #[tokio::test]
    async fn put_then_get_bumps_version() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDetectorStore::new(tmp.path().join("detectors")).unwrap();
        let ctx = StoreContext::System;

        assert_eq!(store.put(&ctx, "det-1", &detector()).await.unwrap(), 1);
        assert_eq!(store.put(&ctx, "det-1", &detector()).await.unwrap(), 2);

        let got = store.get(&ctx, "det-1").await.unwrap();
        assert!(got.exists);
        assert_eq!(got.version, Some(2));
        let parsed = AnomalyDetector::parse(got.source.as_ref().unwrap(), &got.id, got.version).unwrap();
        assert_eq!(parsed.detector_id.as_deref(), Some("det-1"));
        assert_eq!(parsed.version, Some(2));
        assert_eq!(parsed.name, "cpu");
    }

    #[tokio::test]
    async fn missing_and_unsafe_ids_are_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDetectorStore::new(tmp.path()).unwrap();
        let ctx = StoreContext::System;
        assert!(!store.get(&ctx, "nope").await.unwrap().exists);
        assert!(!store.get(&ctx, "../etc").await.unwrap().exists);
        assert!(matches!(
            store.put(&ctx, "a/b", &detector()).await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDetectorStore::new(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("bad.json"), "{not json").unwrap();
        assert!(matches!(
            store.get(&StoreContext::System, "bad").await,
            Err(StoreError::Json(_))
        ));
    }
}
