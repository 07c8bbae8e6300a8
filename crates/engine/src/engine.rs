//! Detection engine seam and the reference z-score implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use adwatch_core::{AnomalyDetector, AnomalyResult, FeatureData};

use crate::buckets::Buckets;
use crate::error::{EngineError, Result};
use crate::source::{FeatureSeries, FeatureSource};

/// Runs a detector over `[period_start, period_end)`.
///
/// The returned future resolves exactly once, with either the per-bucket
/// results (ordered by time) or the failure cause.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    async fn execute_detector(
        &self,
        detector: &AnomalyDetector,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Vec<AnomalyResult>>;
}

/// Scores each bucket by its largest per-feature z-score against the
/// window's own population.
pub struct ZScoreEngine {
    source: Arc<dyn FeatureSource>,
    threshold: f64,
    max_buckets: usize,
}

impl ZScoreEngine {
    pub fn new(source: Arc<dyn FeatureSource>, threshold: f64, max_buckets: usize) -> Self {
        Self {
            source,
            threshold,
            max_buckets,
        }
    }
}

#[async_trait]
impl DetectionEngine for ZScoreEngine {
    async fn execute_detector(
        &self,
        detector: &AnomalyDetector,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Vec<AnomalyResult>> {
        if detector.enabled_features().next().is_none() {
            return Err(EngineError::NoEnabledFeatures);
        }
        let interval = detector
            .detection_interval
            .to_duration()
            .map_err(|e| EngineError::InvalidDetector(e.to_string()))?;
        let buckets = Buckets::split(period_start, period_end, interval, self.max_buckets)?;

        let series = self.source.extract(detector, &buckets).await?;
        let results = score_buckets(detector, &buckets, &series, self.threshold);

        tracing::debug!(
            detector_id = %detector.id_for_logs(),
            buckets = buckets.len(),
            anomalies = results.iter().filter(|r| r.is_anomalous()).count(),
            "Detector executed"
        );
        Ok(results)
    }
}

/// Mean and stddev of the present values. Stddev is floored at EPSILON.
pub fn series_stats(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let variance = present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, variance.sqrt().max(f64::EPSILON)))
}

/// Map a raw score onto [0, 1]; 0 at or below the threshold.
pub fn anomaly_grade(score: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 || score <= threshold {
        return 0.0;
    }
    ((score - threshold) / threshold).clamp(f64::EPSILON, 1.0)
}

fn score_buckets(
    detector: &AnomalyDetector,
    buckets: &Buckets,
    series: &[FeatureSeries],
    threshold: f64,
) -> Vec<AnomalyResult> {
    let stats: Vec<Option<(f64, f64)>> = series.iter().map(|s| series_stats(&s.values)).collect();
    let feature_count = series.len().max(1) as f64;

    (0..buckets.len())
        .map(|i| {
            let (data_start_time, data_end_time) = buckets.bounds(i);
            let mut score: f64 = 0.0;
            let mut with_data = 0usize;
            let feature_data = series
                .iter()
                .zip(&stats)
                .map(|(s, stat)| {
                    let data = s.values.get(i).copied().flatten();
                    if let (Some(v), Some((mean, std))) = (data, stat) {
                        with_data += 1;
                        score = score.max((v - mean).abs() / std);
                    }
                    FeatureData {
                        feature_id: s.feature_id.clone(),
                        feature_name: s.feature_name.clone(),
                        data,
                    }
                })
                .collect();

            AnomalyResult {
                detector_id: detector.detector_id.clone(),
                data_start_time,
                data_end_time,
                anomaly_score: score,
                anomaly_grade: anomaly_grade(score, threshold),
                confidence: with_data as f64 / feature_count,
                feature_data,
                error: None,
            }
        })
        .collect()
}
