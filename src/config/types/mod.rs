//! Utility types for configuration.

mod error;

pub use error::{ConfigDiagnostics, ConfigError};
