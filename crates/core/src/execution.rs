//! Execution input: what a preview or run request asks to evaluate.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::detector::{value_kind, AnomalyDetector};
use crate::error::{AdwatchError, Result};
use crate::time::deserialize_opt_instant;

/// Decoded execution request.
///
/// Only the detector id may change after construction, when the request
/// path supplies one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionInput {
    detector_id: Option<String>,
    detector: Option<AnomalyDetector>,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ExecutionInputBody {
    #[serde(default)]
    pub detector_id: Option<String>,
    #[serde(default)]
    pub detector: Option<AnomalyDetector>,
    /// Epoch milliseconds or RFC 3339.
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    #[schema(value_type = Option<String>)]
    pub period_start: Option<DateTime<Utc>>,
    /// Epoch milliseconds or RFC 3339.
    #[serde(default, deserialize_with = "deserialize_opt_instant")]
    #[schema(value_type = Option<String>)]
    pub period_end: Option<DateTime<Utc>>,
}

impl ExecutionInput {
    pub fn new(
        detector_id: Option<String>,
        detector: Option<AnomalyDetector>,
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            detector_id,
            detector,
            period_start,
            period_end,
        }
    }

    /// Decode a request body. The body must be a JSON object; a path id,
    /// when present, replaces whatever id the body carried.
    pub fn parse(body: &[u8], path_detector_id: Option<&str>) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(AdwatchError::NotAnObject(value_kind(&value)));
        }
        let body: ExecutionInputBody = serde_json::from_value(value)?;
        let mut input = Self::new(body.detector_id, body.detector, body.period_start, body.period_end);
        if let Some(id) = path_detector_id {
            input.set_detector_id(id.to_string());
        }
        Ok(input)
    }

    pub fn set_detector_id(&mut self, id: String) {
        self.detector_id = Some(id);
    }

    /// Id that is present and not whitespace-only.
    pub fn non_blank_detector_id(&self) -> Option<&str> {
        self.detector_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Both bounds, when both are set.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.period_start?, self.period_end?))
    }

    /// Split into the inline detector (if any) and the rest of the input.
    pub fn take_detector(&mut self) -> Option<AnomalyDetector> {
        self.detector.take()
    }
}
