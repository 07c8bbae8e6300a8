/// Terminal path segment of the preview routes.
pub const PREVIEW: &str = "preview";
/// Terminal path segment of the run route.
pub const RUN: &str = "run";

/// Which flow an execution request takes, decided once from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionRoute {
    /// Ad-hoc evaluation, inline or stored detector, nothing persisted.
    Preview,
    /// Execution of a persisted detector through the anomaly-result action.
    Run,
}

impl ExecutionRoute {
    pub fn classify(path: &str) -> Option<Self> {
        let last = path.trim_end_matches('/').rsplit('/').next()?;
        match last {
            PREVIEW => Some(Self::Preview),
            RUN => Some(Self::Run),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => PREVIEW,
            Self::Run => RUN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_last_segment() {
        assert_eq!(ExecutionRoute::classify("/_adwatch/detectors/d1/preview"), Some(ExecutionRoute::Preview));
        assert_eq!(ExecutionRoute::classify("/_adwatch/detectors/preview/"), Some(ExecutionRoute::Preview));
        assert_eq!(ExecutionRoute::classify("/_adwatch/detectors/d1/run"), Some(ExecutionRoute::Run));
        assert_eq!(ExecutionRoute::classify("/_adwatch/detectors/d1/rerun"), None);
        assert_eq!(ExecutionRoute::classify("/_adwatch/detectors/d1"), None);
    }
}
