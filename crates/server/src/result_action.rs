//! Anomaly-result action: executes a persisted detector for a window and
//! answers with the latest bucket.
//!
//! The run route hands requests to this action unchanged and returns its
//! response as-is, so the action owns its own HTTP contract.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use adwatch_core::time::from_epoch_millis;
use adwatch_core::{AnomalyDetector, FeatureData};
use adwatch_engine::{DetectionEngine, EngineError};

use crate::api::ErrorResponse;
use crate::store::{DetectorStore, StoreContext, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyResultRequest {
    pub detector_id: String,
    pub start_millis: i64,
    pub end_millis: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct AnomalyResultResponse {
    pub anomaly_grade: f64,
    pub confidence: f64,
    pub anomaly_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_end_time: Option<DateTime<Utc>>,
    pub feature_data: Vec<FeatureData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AnomalyResultResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnomalyResultError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Can't find anomaly detector with id:{0}")]
    DetectorNotFound(String),

    #[error("Detector lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Stored detector is unreadable: {0}")]
    CorruptDetector(String),

    #[error("Detection failed: {0}")]
    Engine(#[from] EngineError),
}

impl AnomalyResultError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DetectorNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::CorruptDetector(_) | Self::Engine(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AnomalyResultError {
    fn into_response(self) -> Response {
        ErrorResponse::respond(self.status(), self.to_string())
    }
}

#[async_trait]
pub trait AnomalyResultAction: Send + Sync {
    async fn execute(
        &self,
        request: AnomalyResultRequest,
    ) -> Result<AnomalyResultResponse, AnomalyResultError>;
}

/// In-process action backed by the detector store and detection engine.
pub struct LocalAnomalyResultAction {
    store: Arc<dyn DetectorStore>,
    engine: Arc<dyn DetectionEngine>,
}

impl LocalAnomalyResultAction {
    pub fn new(store: Arc<dyn DetectorStore>, engine: Arc<dyn DetectionEngine>) -> Self {
        Self { store, engine }
    }
}

#[async_trait]
impl AnomalyResultAction for LocalAnomalyResultAction {
    async fn execute(
        &self,
        request: AnomalyResultRequest,
    ) -> Result<AnomalyResultResponse, AnomalyResultError> {
        let id = request.detector_id.trim();
        if id.is_empty() {
            return Err(AnomalyResultError::InvalidRequest("Must set anomaly detector id".into()));
        }
        let start = from_epoch_millis(request.start_millis)
            .map_err(|e| AnomalyResultError::InvalidRequest(e.to_string()))?;
        let end = from_epoch_millis(request.end_millis)
            .map_err(|e| AnomalyResultError::InvalidRequest(e.to_string()))?;
        if start >= end {
            return Err(AnomalyResultError::InvalidRequest(
                "Period start date should be before end date".into(),
            ));
        }

        let got = self.store.get(&StoreContext::System, id).await?;
        let source = match (got.exists, got.source) {
            (true, Some(source)) => source,
            _ => return Err(AnomalyResultError::DetectorNotFound(id.to_string())),
        };
        let detector = AnomalyDetector::parse(&source, id, got.version)
            .map_err(|e| AnomalyResultError::CorruptDetector(e.to_string()))?;

        let results = self.engine.execute_detector(&detector, start, end).await?;
        tracing::info!(detector_id = %id, buckets = results.len(), "Anomaly result computed");

        Ok(match results.into_iter().last() {
            Some(latest) => AnomalyResultResponse {
                anomaly_grade: latest.anomaly_grade,
                confidence: latest.confidence,
                anomaly_score: latest.anomaly_score,
                data_start_time: Some(latest.data_start_time),
                data_end_time: Some(latest.data_end_time),
                feature_data: latest.feature_data,
                error: latest.error,
            },
            None => AnomalyResultResponse {
                anomaly_grade: 0.0,
                confidence: 0.0,
                anomaly_score: 0.0,
                data_start_time: None,
                data_end_time: None,
                feature_data: Vec::new(),
                error: Some("No data in the requested window".into()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDetectorStore;
    use adwatch_core::AnomalyResult;
    use serde_json::json;

    struct OneBucketEngine;

    #[async_trait]
    impl DetectionEngine for OneBucketEngine {
        async fn execute_detector(
            &self,
            detector: &AnomalyDetector,
            period_start: DateTime<Utc>,
            period_end: DateTime<Utc>,
        ) -> Result<Vec<AnomalyResult>, EngineError> {
            Ok(vec![AnomalyResult {
                detector_id: detector.detector_id.clone(),
                data_start_time: period_start,
                data_end_time: period_end,
                anomaly_score: 4.0,
                anomaly_grade: 0.5,
                confidence: 1.0,
                feature_data: vec![],
                error: None,
            }])
        }
    }

    fn stored() -> serde_json::Value {
        json!({
            "name": "cpu",
            "time_field": "ts",
            "indices": ["metrics"],
            "feature_attributes": [{
                "feature_name": "avg_cpu",
                "aggregation_query": { "avg_cpu": { "avg": { "field": "cpu" } } }
            }],
            "detection_interval": { "period": { "interval": 1, "unit": "Minutes" } }
        })
    }

    fn action(store: Arc<MemoryDetectorStore>) -> LocalAnomalyResultAction {
        LocalAnomalyResultAction::new(store, Arc::new(OneBucketEngine))
    }

    #[tokio::test]
    async fn runs_stored_detector() {
        let store = Arc::new(MemoryDetectorStore::new());
        store.insert_raw("det-1", stored().to_string());
        let response = action(store.clone())
            .execute(AnomalyResultRequest {
                detector_id: "det-1".into(),
                start_millis: 1_704_067_200_000,
                end_millis: 1_704_153_600_000,
            })
            .await
            .unwrap();
        assert_eq!(response.anomaly_grade, 0.5);
        assert_eq!(store.last_context(), Some(StoreContext::System));
    }

    #[tokio::test]
    async fn unknown_detector_is_404() {
        let err = action(Arc::new(MemoryDetectorStore::new()))
            .execute(AnomalyResultRequest {
                detector_id: "ghost".into(),
                start_millis: 0,
                end_millis: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn inverted_window_is_400() {
        let err = action(Arc::new(MemoryDetectorStore::new()))
            .execute(AnomalyResultRequest {
                detector_id: "det-1".into(),
                start_millis: 10,
                end_millis: 10,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
