//! adwatch HTTP server: detector preview and run endpoints over a detector
//! store and a detection engine.

pub mod api;
pub mod cli;
pub mod execute;
pub mod result_action;
pub mod router;
pub mod startup;
pub mod state;
pub mod store;
