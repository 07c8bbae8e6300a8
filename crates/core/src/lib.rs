pub mod config;
pub mod detector;
pub mod error;
pub mod execution;
pub mod result;
pub mod settings;
pub mod time;

pub use config::Config;
pub use detector::*;
pub use error::*;
pub use execution::ExecutionInput;
pub use result::*;
pub use settings::{LiveSettings, SettingsSnapshot, SettingsUpdate};
