//! Uniform time buckets covering an execution window.

use chrono::{DateTime, Duration, Utc};

use crate::error::{EngineError, Result};

/// `count` consecutive buckets of width `interval` starting at `start`.
///
/// A trailing partial interval at the end of the window is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buckets {
    start: DateTime<Utc>,
    interval: Duration,
    count: usize,
}

impl Buckets {
    pub fn split(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Duration,
        max_buckets: usize,
    ) -> Result<Self> {
        let window_ms = (end - start).num_milliseconds();
        let interval_ms = interval.num_milliseconds();
        if interval_ms <= 0 {
            return Err(EngineError::InvalidDetector("detection interval must be positive".into()));
        }
        if window_ms < interval_ms {
            return Err(EngineError::WindowTooShort);
        }
        let count = usize::try_from(window_ms / interval_ms).unwrap_or(usize::MAX);
        if count > max_buckets {
            return Err(EngineError::TooManyBuckets {
                buckets: count,
                limit: max_buckets,
            });
        }
        Ok(Self {
            start,
            interval,
            count,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bucket holding `ts`, if it falls inside the covered range.
    pub fn index_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        let offset = (ts - self.start).num_milliseconds();
        if offset < 0 {
            return None;
        }
        let idx = usize::try_from(offset / self.interval.num_milliseconds()).ok()?;
        (idx < self.count).then_some(idx)
    }

    /// `[start, end)` of bucket `i`.
    pub fn bounds(&self, i: usize) -> (DateTime<Utc>, DateTime<Utc>) {
        // i < count, and count * interval fits the window, so the offset fits i64 ms.
        let offset_ms = self
            .interval
            .num_milliseconds()
            .saturating_mul(i64::try_from(i).unwrap_or(i64::MAX));
        let start = self.start + Duration::milliseconds(offset_ms);
        (start, start + self.interval)
    }
}
