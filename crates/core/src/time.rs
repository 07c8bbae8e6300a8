//! Instant parsing shared by request bodies and time-series rows.
//!
//! Accepts epoch milliseconds (number or digit string) and RFC 3339 strings.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{AdwatchError, Result};

pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AdwatchError::InvalidTimestamp(millis.to_string()))
}

pub fn parse_instant(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| AdwatchError::InvalidTimestamp(n.to_string()))?;
            from_epoch_millis(millis)
        }
        Value::String(s) => parse_instant_str(s),
        other => Err(AdwatchError::InvalidTimestamp(other.to_string())),
    }
}

pub fn parse_instant_str(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(millis) = s.parse::<i64>() {
        return from_epoch_millis(millis);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AdwatchError::InvalidTimestamp(s.to_string()))
}

/// Serde adapter for optional instants; `null` and absence both map to `None`.
pub fn deserialize_opt_instant<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_instant(&v).map(Some).map_err(serde::de::Error::custom),
    }
}
