//! Feature sources: where the engine gets per-bucket feature values.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use adwatch_core::time::parse_instant;
use adwatch_core::AnomalyDetector;

use crate::aggregation::{as_number, field_value, Accumulator, Aggregation};
use crate::buckets::Buckets;
use crate::error::{EngineError, Result};

/// Per-bucket values of one enabled feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    pub feature_id: String,
    pub feature_name: String,
    pub values: Vec<Option<f64>>,
}

/// Extracts enabled feature values for every bucket of a window.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// One series per enabled feature, in detector order, each `buckets.len()` long.
    async fn extract(&self, detector: &AnomalyDetector, buckets: &Buckets) -> Result<Vec<FeatureSeries>>;
}

/// Reads `{dir}/{index}.jsonl`, one JSON object per line.
///
/// Missing index files contribute no rows. Rows without a parsable
/// time field are skipped.
pub struct JsonlFeatureSource {
    dir: PathBuf,
}

impl JsonlFeatureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FeatureSource for JsonlFeatureSource {
    async fn extract(&self, detector: &AnomalyDetector, buckets: &Buckets) -> Result<Vec<FeatureSeries>> {
        let dir = self.dir.clone();
        let detector = detector.clone();
        let buckets = *buckets;
        tokio::task::spawn_blocking(move || extract_blocking(&dir, &detector, &buckets))
            .await
            .map_err(|e| EngineError::Source(format!("extraction task failed: {}", e)))?
    }
}

fn extract_blocking(dir: &Path, detector: &AnomalyDetector, buckets: &Buckets) -> Result<Vec<FeatureSeries>> {
    let filter = RowFilter::parse(detector.filter_query.as_ref())?;
    let features: Vec<_> = detector
        .enabled_features()
        .map(|f| Aggregation::from_feature(f).map(|agg| (f, agg)))
        .collect::<Result<_>>()?;

    let mut accs = vec![vec![Accumulator::default(); buckets.len()]; features.len()];
    let mut skipped = 0usize;

    for index in &detector.indices {
        let path = dir.join(format!("{}.jsonl", index));
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(index = %index, "No series file for index");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let Ok(row) = serde_json::from_str::<Value>(line) else {
                skipped += 1;
                continue;
            };
            let Some(ts) = field_value(&row, &detector.time_field).and_then(|v| parse_instant(v).ok()) else {
                skipped += 1;
                continue;
            };
            let Some(bucket) = buckets.index_of(ts) else {
                continue;
            };
            if !filter.matches(&row) {
                continue;
            }
            for (i, (_, agg)) in features.iter().enumerate() {
                if let Some(value) = field_value(&row, &agg.field) {
                    match as_number(value) {
                        Some(n) => accs[i][bucket].push(n),
                        None => accs[i][bucket].push_present(),
                    }
                }
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, detector_id = %detector.id_for_logs(), "Skipped unparsable rows");
    }

    Ok(features
        .iter()
        .zip(accs)
        .map(|((feature, agg), bucket_accs)| FeatureSeries {
            feature_id: feature.key().to_string(),
            feature_name: feature.feature_name.clone(),
            values: bucket_accs.iter().map(|a| a.finish(agg.op)).collect(),
        })
        .collect())
}

/// The subset of filter queries the JSONL source understands.
enum RowFilter {
    All,
    Term(Vec<(String, Value)>),
}

impl RowFilter {
    fn parse(query: Option<&Value>) -> Result<Self> {
        let Some(query) = query else {
            return Ok(Self::All);
        };
        if query.get("match_all").is_some() {
            return Ok(Self::All);
        }
        if let Some(Value::Object(terms)) = query.get("term") {
            return Ok(Self::Term(
                terms.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ));
        }
        Err(EngineError::UnsupportedFilter(query.to_string()))
    }

    fn matches(&self, row: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Term(terms) => terms
                .iter()
                .all(|(field, expected)| field_value(row, field) == Some(expected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::{Feature, IntervalConfig};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn detector(filter: Option<Value>) -> AnomalyDetector {
        AnomalyDetector {
            detector_id: Some("d1".into()),
            version: None,
            name: "cpu".into(),
            description: None,
            time_field: "ts".into(),
            indices: vec!["metrics".into(), "missing".into()],
            feature_attributes: vec![
                Feature {
                    feature_id: Some("f1".into()),
                    feature_name: "avg_cpu".into(),
                    feature_enabled: true,
                    aggregation_query: json!({ "avg_cpu": { "avg": { "field": "cpu" } } }),
                },
                Feature {
                    feature_id: Some("f2".into()),
                    feature_name: "disabled".into(),
                    feature_enabled: false,
                    aggregation_query: json!({ "x": { "sum": { "field": "cpu" } } }),
                },
            ],
            filter_query: filter,
            detection_interval: IntervalConfig::minutes(10),
            window_delay: None,
            shingle_size: 8,
            schema_version: 0,
            last_update_time: None,
        }
    }

    fn write_rows(dir: &Path) {
        let rows = [
            json!({ "ts": "2024-01-01T00:01:00Z", "cpu": 1.0, "host": "a" }),
            json!({ "ts": "2024-01-01T00:02:00Z", "cpu": 3.0, "host": "b" }),
            json!({ "ts": "2024-01-01T00:25:00Z", "cpu": 7.0, "host": "a" }),
            json!({ "ts": "not a time", "cpu": 100.0 }),
        ];
        let body: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        std::fs::write(dir.join("metrics.jsonl"), body.join("\n")).unwrap();
    }

    fn buckets() -> Buckets {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Buckets::split(start, start + Duration::minutes(30), Duration::minutes(10), 100).unwrap()
    }

    #[tokio::test]
    async fn aggregates_enabled_features_per_bucket() {
        let tmp = tempfile::tempdir().unwrap();
        write_rows(tmp.path());
        let source = JsonlFeatureSource::new(tmp.path());
        let series = source.extract(&detector(None), &buckets()).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].feature_id, "f1");
        assert_eq!(series[0].values, vec![Some(2.0), None, Some(7.0)]);
    }

    #[tokio::test]
    async fn term_filter_restricts_rows() {
        let tmp = tempfile::tempdir().unwrap();
        write_rows(tmp.path());
        let source = JsonlFeatureSource::new(tmp.path());
        let series = source
            .extract(&detector(Some(json!({ "term": { "host": "b" } }))), &buckets())
            .await
            .unwrap();
        assert_eq!(series[0].values, vec![Some(3.0), None, None]);
    }

    #[tokio::test]
    async fn unsupported_filter_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = JsonlFeatureSource::new(tmp.path());
        let result = source
            .extract(&detector(Some(json!({ "range": { "cpu": { "gt": 1 } } }))), &buckets())
            .await;
        assert!(matches!(result, Err(EngineError::UnsupportedFilter(_))));
    }
}
