use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub detection: DetectionConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ADWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ADWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            detection: DetectionConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{} base={}", self.server.host, self.server.port, self.server.base_path);
        tracing::info!("  storage:    data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  detection:  enabled={}, max_features={}, timeout={}s, threshold={}",
            self.detection.enabled,
            self.detection.max_anomaly_features,
            self.detection.request_timeout_secs,
            self.detection.anomaly_threshold
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Route prefix for the detector endpoints.
    pub base_path: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let base_path = profiled_env_or(p, "ADWATCH_BASE_PATH", "/_adwatch/detectors");
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 9250),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            base_path: normalize_base_path(&base_path),
        }
    }
}

/// Leading slash, no trailing slash.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
        }
    }

    /// Directory holding one JSON document per persisted detector.
    pub fn detectors_dir(&self) -> PathBuf {
        self.data_dir.join("detectors")
    }

    /// Directory holding the JSONL time series the reference engine reads.
    pub fn series_dir(&self) -> PathBuf {
        self.data_dir.join("series")
    }
}

// ── Detection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Initial value of the live `enabled` setting.
    pub enabled: bool,
    /// Initial value of the live max-feature-count setting.
    pub max_anomaly_features: usize,
    /// Initial value of the live request timeout.
    pub request_timeout_secs: u64,
    /// |z| above which a bucket is graded anomalous.
    pub anomaly_threshold: f64,
    /// Upper bound on buckets a single execution may span.
    pub max_buckets: usize,
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "ADWATCH_ENABLED", true),
            max_anomaly_features: profiled_env_parse(p, "ADWATCH_MAX_ANOMALY_FEATURES", 5),
            request_timeout_secs: profiled_env_parse(p, "ADWATCH_REQUEST_TIMEOUT_SECS", 10),
            anomaly_threshold: profiled_env_parse(p, "ADWATCH_ANOMALY_THRESHOLD", 3.0),
            max_buckets: profiled_env_parse(p, "ADWATCH_MAX_BUCKETS", 10_000),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_anomaly_features: 5,
            request_timeout_secs: 10,
            anomaly_threshold: 3.0,
            max_buckets: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path("_adwatch/detectors/"), "/_adwatch/detectors");
        assert_eq!(normalize_base_path("/x"), "/x");
    }

    #[test]
    fn profiled_keys_take_precedence() {
        // Unique profile name keeps this test independent of the process env.
        env::set_var("CFGTESTA_ADWATCH_MAX_ANOMALY_FEATURES", "9");
        env::set_var("CFGTESTA_ADWATCH_ENABLED", "false");
        let config = Config::for_profile("cfgtesta");
        assert_eq!(config.profile, "CFGTESTA");
        assert_eq!(config.detection.max_anomaly_features, 9);
        assert!(!config.detection.enabled);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        env::set_var("CFGTESTB_ADWATCH_REQUEST_TIMEOUT_SECS", "soon");
        let config = Config::for_profile("CFGTESTB");
        assert_eq!(config.detection.request_timeout(), Duration::from_secs(10));
    }
}
