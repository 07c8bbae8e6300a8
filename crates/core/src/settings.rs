//! Process-wide detection settings that can change while the server runs.
//!
//! Each value is an independent scalar held in an atomic. Reads are relaxed:
//! a request sees either the old or the new value, never a torn one.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

/// Returned to every request while detection is administratively disabled.
pub const DISABLED_ERR_MSG: &str =
    "Anomaly detection is disabled. To enable update adwatch.enabled to true";

#[derive(Debug)]
pub struct LiveSettings {
    enabled: AtomicBool,
    max_anomaly_features: AtomicUsize,
    request_timeout_ms: AtomicU64,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub max_anomaly_features: Option<usize>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SettingsSnapshot {
    pub enabled: bool,
    pub max_anomaly_features: usize,
    pub request_timeout_ms: u64,
}

impl LiveSettings {
    pub fn new(enabled: bool, max_anomaly_features: usize, request_timeout: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            max_anomaly_features: AtomicUsize::new(max_anomaly_features),
            request_timeout_ms: AtomicU64::new(duration_millis(request_timeout)),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.enabled,
            config.max_anomaly_features,
            config.request_timeout(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn max_anomaly_features(&self) -> usize {
        self.max_anomaly_features.load(Ordering::Relaxed)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.load(Ordering::Relaxed))
    }

    /// The single write path for live updates.
    pub fn apply(&self, update: &SettingsUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled.store(enabled, Ordering::Relaxed);
            tracing::info!(enabled, "Updated detection enabled setting");
        }
        if let Some(max) = update.max_anomaly_features {
            self.max_anomaly_features.store(max, Ordering::Relaxed);
            tracing::info!(max_anomaly_features = max, "Updated max anomaly features");
        }
        if let Some(ms) = update.request_timeout_ms {
            self.request_timeout_ms.store(ms, Ordering::Relaxed);
            tracing::info!(request_timeout_ms = ms, "Updated request timeout");
        }
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            enabled: self.is_enabled(),
            max_anomaly_features: self.max_anomaly_features(),
            request_timeout_ms: self.request_timeout_ms.load(Ordering::Relaxed),
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
