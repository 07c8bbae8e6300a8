//! Detection engine for adwatch.
//!
//! This crate provides:
//! - `DetectionEngine` trait, the seam the request layer executes through
//! - `ZScoreEngine`, a reference engine scoring buckets by population z-score
//! - `FeatureSource` trait and a JSONL-file implementation
//! - Bucketing and aggregation helpers

pub mod aggregation;
pub mod buckets;
pub mod engine;
pub mod error;
pub mod source;

pub use buckets::Buckets;
pub use engine::{DetectionEngine, ZScoreEngine};
pub use error::EngineError;
pub use source::{FeatureSeries, FeatureSource, JsonlFeatureSource};
