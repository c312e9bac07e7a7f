//! Error types for scope operations

use thiserror::Error;

/// Boxed error returned by work running inside a scope.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a scope's work ended (or failed a single step) abnormally
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("scope cancelled{}", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled { reason: Option<String> },

    #[error("scope work failed")]
    Failed(#[source] BoxError),

    #[error("callback panicked: {message}")]
    Panicked { message: String },

    #[error("no tokio runtime available to dispatch on")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}

impl ScopeError {
    /// Wrap any error raised by scope work.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Build a `Panicked` error from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked { message }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
