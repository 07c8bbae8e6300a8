//! Feature aggregation queries: parsing and per-bucket accumulation.

use serde_json::Value;

use adwatch_core::Feature;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOp {
    Avg,
    Sum,
    Min,
    Max,
    ValueCount,
}

impl AggregationOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "avg" => Some(Self::Avg),
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "value_count" => Some(Self::ValueCount),
            _ => None,
        }
    }
}

/// A parsed `{ name: { op: { "field": f } } }` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub op: AggregationOp,
    pub field: String,
}

impl Aggregation {
    pub fn from_feature(feature: &Feature) -> Result<Self> {
        let invalid = |msg: &str| {
            EngineError::InvalidDetector(format!("feature '{}': {}", feature.feature_name, msg))
        };
        let name = feature
            .aggregation_name()
            .ok_or_else(|| invalid("aggregation query must have exactly one named aggregation"))?;
        let body = feature.aggregation_query[name]
            .as_object()
            .filter(|m| m.len() == 1)
            .ok_or_else(|| invalid("aggregation must hold exactly one operator"))?;
        let (op_name, op_body) = body.iter().next().ok_or_else(|| invalid("empty aggregation"))?;
        let op = AggregationOp::parse(op_name)
            .ok_or_else(|| invalid(&format!("unsupported aggregation '{}'", op_name)))?;
        let field = op_body
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("aggregation needs a 'field'"))?;
        Ok(Self {
            name: name.to_string(),
            op,
            field: field.to_string(),
        })
    }
}

/// Running totals for one bucket of one feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Count-only observation (the field exists but is not numeric).
    pub fn push_present(&mut self) {
        self.count += 1;
    }

    pub fn finish(&self, op: AggregationOp) -> Option<f64> {
        match op {
            AggregationOp::ValueCount => Some(self.count as f64),
            _ if self.count == 0 => None,
            AggregationOp::Avg => Some(self.sum / self.count as f64),
            AggregationOp::Sum => Some(self.sum),
            AggregationOp::Min => self.min,
            AggregationOp::Max => self.max,
        }
    }
}

/// Look up a dotted field path (`host.cpu`) in a JSON row.
pub fn field_value<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(row, |node, key| node.get(key))
        .filter(|v| !v.is_null())
}

/// Numeric view of a field value; digit strings count as numbers.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
