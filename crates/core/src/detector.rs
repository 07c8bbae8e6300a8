//! Detector definitions: the configuration an execution runs against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdwatchError, Result};

/// A named detector: which indices to read, which features to extract,
/// and how the time axis is bucketed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct AnomalyDetector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_id: Option<String>,
    /// Revision marker assigned by the store on every write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub time_field: String,
    pub indices: Vec<String>,
    #[serde(default)]
    pub feature_attributes: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub filter_query: Option<Value>,
    pub detection_interval: IntervalConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_delay: Option<IntervalConfig>,
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}

fn default_shingle_size() -> usize {
    8
}

impl AnomalyDetector {
    /// Parse a stored detector document.
    ///
    /// The document must be a JSON object. The store's id and version win
    /// over whatever the document itself carries.
    pub fn parse(source: &[u8], id: &str, version: Option<u64>) -> Result<Self> {
        let value: Value = serde_json::from_slice(source)?;
        if !value.is_object() {
            return Err(AdwatchError::NotAnObject(value_kind(&value)));
        }
        let mut detector: AnomalyDetector = serde_json::from_value(value)?;
        detector.detector_id = Some(id.to_string());
        detector.version = version;
        Ok(detector)
    }

    /// Id for log correlation; `"<inline>"` for detectors that were never stored.
    pub fn id_for_logs(&self) -> &str {
        self.detector_id.as_deref().unwrap_or("<inline>")
    }

    pub fn enabled_features(&self) -> impl Iterator<Item = &Feature> {
        self.feature_attributes.iter().filter(|f| f.feature_enabled)
    }
}

/// One extraction/aggregation definition feeding the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    pub feature_name: String,
    #[serde(default = "default_true")]
    pub feature_enabled: bool,
    /// Single-key object: `{ "<agg name>": { "<op>": { "field": "<field>" } } }`.
    #[schema(value_type = Object)]
    pub aggregation_query: Value,
}

fn default_true() -> bool {
    true
}

impl Feature {
    /// Name of the aggregation, i.e. the single top-level key of the query.
    pub fn aggregation_name(&self) -> Option<&str> {
        match &self.aggregation_query {
            Value::Object(map) if map.len() == 1 => map.keys().next().map(String::as_str),
            _ => None,
        }
    }

    /// Stable key for result attribution: explicit id, else the feature name.
    pub fn key(&self) -> &str {
        self.feature_id.as_deref().unwrap_or(&self.feature_name)
    }
}

/// `{ "period": { "interval": 10, "unit": "Minutes" } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct IntervalConfig {
    pub period: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct Period {
    pub interval: u64,
    pub unit: IntervalUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub enum IntervalUnit {
    #[serde(alias = "seconds")]
    Seconds,
    #[serde(alias = "minutes")]
    Minutes,
    #[serde(alias = "hours")]
    Hours,
    #[serde(alias = "days")]
    Days,
}

impl IntervalConfig {
    pub fn minutes(interval: u64) -> Self {
        Self {
            period: Period {
                interval,
                unit: IntervalUnit::Minutes,
            },
        }
    }

    pub fn to_duration(&self) -> Result<chrono::Duration> {
        let n = i64::try_from(self.period.interval)
            .map_err(|_| AdwatchError::InvalidInterval(format!("{} is too large", self.period.interval)))?;
        if n == 0 {
            return Err(AdwatchError::InvalidInterval("interval must be positive".into()));
        }
        let duration = match self.period.unit {
            IntervalUnit::Seconds => chrono::Duration::try_seconds(n),
            IntervalUnit::Minutes => chrono::Duration::try_minutes(n),
            IntervalUnit::Hours => chrono::Duration::try_hours(n),
            IntervalUnit::Days => chrono::Duration::try_days(n),
        };
        duration.ok_or_else(|| AdwatchError::InvalidInterval(format!("{} is out of range", n)))
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_doc() -> Value {
        json!({
            "detector_id": "ignored",
            "name": "cpu",
            "time_field": "timestamp",
            "indices": ["metrics"],
            "feature_attributes": [{
                "feature_name": "avg_cpu",
                "aggregation_query": { "avg_cpu": { "avg": { "field": "cpu" } } }
            }],
            "detection_interval": { "period": { "interval": 10, "unit": "Minutes" } }
        })
    }

    #[test]
    fn parse_stamps_store_id_and_version() {
        let bytes = serde_json::to_vec(&stored_doc()).unwrap();
        let detector = AnomalyDetector::parse(&bytes, "det-1", Some(3)).unwrap();
        assert_eq!(detector.detector_id.as_deref(), Some("det-1"));
        assert_eq!(detector.version, Some(3));
        assert_eq!(detector.shingle_size, 8);
        assert!(detector.feature_attributes[0].feature_enabled);
    }

    #[test]
    fn parse_rejects_non_object() {
        let err = AnomalyDetector::parse(b"[1,2]", "det-1", None).unwrap_err();
        assert!(matches!(err, AdwatchError::NotAnObject("array")));
    }

    #[test]
    fn aggregation_name_needs_single_key() {
        let mut feature: Feature = serde_json::from_value(json!({
            "feature_name": "f",
            "aggregation_query": { "a": { "sum": { "field": "x" } } }
        }))
        .unwrap();
        assert_eq!(feature.aggregation_name(), Some("a"));
        assert_eq!(feature.key(), "f");

        feature.aggregation_query = json!({ "a": {}, "b": {} });
        assert_eq!(feature.aggregation_name(), None);
    }

    #[test]
    fn interval_units_convert() {
        assert_eq!(IntervalConfig::minutes(10).to_duration().unwrap(), chrono::Duration::minutes(10));
        let zero = IntervalConfig::minutes(0);
        assert!(zero.to_duration().is_err());
        let lower: IntervalConfig =
            serde_json::from_value(json!({ "period": { "interval": 2, "unit": "hours" } })).unwrap();
        assert_eq!(lower.to_duration().unwrap(), chrono::Duration::hours(2));
    }
}
