use std::sync::Arc;

use adwatch_core::LiveSettings;
use adwatch_engine::DetectionEngine;

use crate::result_action::AnomalyResultAction;
use crate::store::DetectorStore;

/// Shared handler state. Every collaborator sits behind a trait object so
/// tests can swap in doubles.
pub struct AppState {
    pub settings: Arc<LiveSettings>,
    pub store: Arc<dyn DetectorStore>,
    pub engine: Arc<dyn DetectionEngine>,
    pub result_action: Arc<dyn AnomalyResultAction>,
}
