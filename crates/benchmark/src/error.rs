//! Errors raised while loading experiment plans and writing reports.

use thiserror::Error;

/// Errors that can occur while reading configuration or persisting results.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Core(#[from] u_firstfit_core::Error),
}
