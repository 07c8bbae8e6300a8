use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detection outcome for one bucket of the execution window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct AnomalyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_id: Option<String>,
    pub data_start_time: DateTime<Utc>,
    pub data_end_time: DateTime<Utc>,
    pub anomaly_score: f64,
    /// 0 for normal buckets, (0, 1] for anomalous ones.
    pub anomaly_grade: f64,
    /// Share of enabled features that had data in the bucket.
    pub confidence: f64,
    pub feature_data: Vec<FeatureData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct FeatureData {
    pub feature_id: String,
    pub feature_name: String,
    /// Extracted value; absent when the bucket held no data for the feature.
    pub data: Option<f64>,
}

impl AnomalyResult {
    pub fn is_anomalous(&self) -> bool {
        self.anomaly_grade > 0.0
    }
}
