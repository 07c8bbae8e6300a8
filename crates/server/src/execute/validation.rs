//! Synchronous request checks. Both run to completion before any store
//! lookup or engine call is started.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use adwatch_core::{AnomalyDetector, ExecutionInput};

use super::route::ExecutionRoute;

pub const MISSING_DETECTOR_ID_MSG: &str = "Must set anomaly detector id";
pub const MISSING_PERIOD_MSG: &str =
    "Must set both period start and end date with epoch of milliseconds";
pub const INVALID_PERIOD_MSG: &str = "Period start date should be before end date";
pub const NO_FEATURE_MSG: &str = "Can't preview detector without feature";

/// Execution input that passed validation, split by route.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedExecution {
    Run {
        detector_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Preview {
        /// Non-blank id, when the request carried one.
        detector_id: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Check the execution input and extract what the route needs from it.
pub fn validate_execution_input(
    route: ExecutionRoute,
    input: &ExecutionInput,
) -> Result<ValidatedExecution, String> {
    match route {
        ExecutionRoute::Run => {
            let Some(id) = input.non_blank_detector_id() else {
                return Err(MISSING_DETECTOR_ID_MSG.to_string());
            };
            let (start, end) = checked_window(input)?;
            Ok(ValidatedExecution::Run {
                detector_id: id.to_string(),
                start,
                end,
            })
        }
        ExecutionRoute::Preview => {
            let (start, end) = checked_window(input)?;
            Ok(ValidatedExecution::Preview {
                detector_id: input.non_blank_detector_id().map(str::to_string),
                start,
                end,
            })
        }
    }
}

fn checked_window(input: &ExecutionInput) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let Some((start, end)) = input.window() else {
        return Err(MISSING_PERIOD_MSG.to_string());
    };
    if start >= end {
        return Err(INVALID_PERIOD_MSG.to_string());
    }
    Ok((start, end))
}

/// Check an inline detector before previewing it. `None` means valid.
pub fn validate_detector(detector: &AnomalyDetector, max_anomaly_features: usize) -> Option<String> {
    let features = &detector.feature_attributes;
    if features.is_empty() {
        return Some(NO_FEATURE_MSG.to_string());
    }
    if features.len() > max_anomaly_features {
        return Some(format!(
            "Can't create anomaly features more than {}",
            max_anomaly_features
        ));
    }
    validate_features_config(detector)
}

fn validate_features_config(detector: &AnomalyDetector) -> Option<String> {
    let mut names = BTreeSet::new();
    let mut duplicate_names = BTreeSet::new();
    let mut agg_names = BTreeSet::new();
    let mut duplicate_agg_names = BTreeSet::new();

    for feature in &detector.feature_attributes {
        if !names.insert(feature.feature_name.as_str()) {
            duplicate_names.insert(feature.feature_name.as_str());
        }
        if let Some(agg) = feature.aggregation_name() {
            if !agg_names.insert(agg) {
                duplicate_agg_names.insert(agg);
            }
        }
    }

    let mut errors = Vec::new();
    if !duplicate_names.is_empty() {
        errors.push(format!(
            "Detector has duplicate feature names: {}",
            join(&duplicate_names)
        ));
    }
    if !duplicate_agg_names.is_empty() {
        errors.push(format!(
            "Detector has duplicate feature aggregation query names: {}",
            join(&duplicate_agg_names)
        ));
    }
    (!errors.is_empty()).then(|| errors.join(". "))
}

fn join(set: &BTreeSet<&str>) -> String {
    set.iter().copied().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::{Feature, IntervalConfig};
    use chrono::TimeZone;
    use serde_json::json;

    fn feature(name: &str, agg: &str) -> Feature {
        Feature {
            feature_id: None,
            feature_name: name.into(),
            feature_enabled: true,
            aggregation_query: json!({ agg: { "avg": { "field": "cpu" } } }),
        }
    }

    fn detector(features: Vec<Feature>) -> AnomalyDetector {
        AnomalyDetector {
            detector_id: None,
            version: None,
            name: "cpu".into(),
            description: None,
            time_field: "ts".into(),
            indices: vec!["metrics".into()],
            feature_attributes: features,
            filter_query: None,
            detection_interval: IntervalConfig::minutes(10),
            window_delay: None,
            shingle_size: 8,
            schema_version: 0,
            last_update_time: None,
        }
    }

    fn input(id: Option<&str>, start_day: Option<u32>, end_day: Option<u32>) -> ExecutionInput {
        ExecutionInput::new(id.map(String::from), None, start_day.map(day), end_day.map(day))
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn run_requires_non_blank_id() {
        let err = validate_execution_input(ExecutionRoute::Run, &input(Some(" "), Some(1), Some(2)));
        assert_eq!(err.unwrap_err(), MISSING_DETECTOR_ID_MSG);

        let ok = validate_execution_input(ExecutionRoute::Run, &input(Some("d1"), Some(1), Some(2)));
        assert_eq!(
            ok.unwrap(),
            ValidatedExecution::Run { detector_id: "d1".into(), start: day(1), end: day(2) }
        );
    }

    #[test]
    fn preview_keeps_only_a_non_blank_id() {
        let blank = validate_execution_input(ExecutionRoute::Preview, &input(Some("  "), Some(1), Some(2)));
        assert_eq!(
            blank.unwrap(),
            ValidatedExecution::Preview { detector_id: None, start: day(1), end: day(2) }
        );
        let none = validate_execution_input(ExecutionRoute::Preview, &input(None, Some(1), Some(2)));
        assert!(matches!(none, Ok(ValidatedExecution::Preview { detector_id: None, .. })));
    }

    #[test]
    fn window_must_be_present_and_ordered() {
        let missing = validate_execution_input(ExecutionRoute::Preview, &input(Some("d"), Some(1), None));
        assert_eq!(missing.unwrap_err(), MISSING_PERIOD_MSG);
        let equal = validate_execution_input(ExecutionRoute::Run, &input(Some("d"), Some(2), Some(2)));
        assert_eq!(equal.unwrap_err(), INVALID_PERIOD_MSG);
        let inverted = validate_execution_input(ExecutionRoute::Run, &input(Some("d"), Some(3), Some(2)));
        assert_eq!(inverted.unwrap_err(), INVALID_PERIOD_MSG);
    }

    #[test]
    fn detector_needs_features_within_limit() {
        assert_eq!(validate_detector(&detector(vec![]), 5).as_deref(), Some(NO_FEATURE_MSG));
        let three = detector(vec![feature("a", "x"), feature("b", "y"), feature("c", "z")]);
        assert_eq!(
            validate_detector(&three, 2).as_deref(),
            Some("Can't create anomaly features more than 2")
        );
        assert_eq!(validate_detector(&three, 3), None);
    }

    #[test]
    fn duplicate_names_are_reported_together() {
        let dup = detector(vec![feature("a", "x"), feature("a", "x"), feature("b", "y")]);
        assert_eq!(
            validate_detector(&dup, 5).as_deref(),
            Some(
                "Detector has duplicate feature names: a. \
                 Detector has duplicate feature aggregation query names: x"
            )
        );
    }
}
