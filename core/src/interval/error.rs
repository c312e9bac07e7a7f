//! Error types for interval construction and definition loading

use std::path::PathBuf;
use thiserror::Error;

use crate::scope::ScopeError;

/// Errors while building an interval or loading its definition
#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("cannot create interval without a dispatcher")]
    Dispatcher(#[from] ScopeError),

    #[error("failed to read interval file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse interval TOML in {origin}")]
    ParseToml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid interval definition in {origin}: {reason}")]
    InvalidDefinition { origin: String, reason: String },
}
