//! Server startup: shared state initialization.

use std::sync::Arc;

use tracing::info;

use adwatch_core::{Config, LiveSettings};
use adwatch_engine::{JsonlFeatureSource, ZScoreEngine};

use crate::result_action::LocalAnomalyResultAction;
use crate::state::AppState;
use crate::store::FileDetectorStore;

/// Build `AppState` from config: file-backed detector store, JSON-lines
/// feature source, z-score engine and the in-process result action.
pub fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = Arc::new(FileDetectorStore::new(config.storage.detectors_dir())?);
    info!("Detector store initialized (dir: {})", store.base_dir().display());

    let source = Arc::new(JsonlFeatureSource::new(config.storage.series_dir()));
    info!("Feature source initialized (dir: {})", source.dir().display());

    let engine = Arc::new(ZScoreEngine::new(
        source,
        config.detection.anomaly_threshold,
        config.detection.max_buckets,
    ));
    let result_action = Arc::new(LocalAnomalyResultAction::new(store.clone(), engine.clone()));
    let settings = Arc::new(LiveSettings::from_config(&config.detection));

    Ok(Arc::new(AppState {
        settings,
        store,
        engine,
        result_action,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_state_under_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::for_profile("STARTUPTEST");
        config.storage.data_dir = tmp.path().to_path_buf();
        config.detection.enabled = false;

        let state = build_app_state(&config).unwrap();
        assert!(!state.settings.is_enabled());
        assert!(tmp.path().join("detectors").is_dir());
    }
}
