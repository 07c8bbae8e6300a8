//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI 3.1 document, served via Scalar UI at `/docs`
//! and as JSON at `/openapi.json`.
//!
//! Detector paths are documented under the default base path.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "adwatch API",
        version = "0.1.0",
        description = "Anomaly detector preview and run endpoints.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Settings", description = "Live detection settings"),
        (name = "Detectors", description = "Detector preview and run"),
    ),
    paths(
        // Health
        crate::api::health::health,
        // Settings
        crate::api::settings::get_settings,
        crate::api::settings::update_settings,
        // Detectors
        crate::execute::preview_detector,
        crate::execute::preview_inline,
        crate::execute::run_detector,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        adwatch_core::SettingsSnapshot,
        adwatch_core::SettingsUpdate,
        adwatch_core::execution::ExecutionInputBody,
        adwatch_core::AnomalyDetector,
        adwatch_core::Feature,
        adwatch_core::IntervalConfig,
        adwatch_core::Period,
        adwatch_core::IntervalUnit,
        adwatch_core::AnomalyResult,
        adwatch_core::FeatureData,
        crate::result_action::AnomalyResultResponse,
    ))
)]
pub struct ApiDoc;
