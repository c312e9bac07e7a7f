//! Injectable scheduler that scopes spawn their work on

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::ScopeError;

/// Where a scope runs its work.
///
/// Wraps a tokio runtime handle so callers can pin timers to a specific
/// runtime (e.g. a UI-bound current-thread runtime) instead of whatever
/// runtime happens to be ambient.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handle: Handle,
}

impl Dispatcher {
    /// Dispatch on the runtime the caller is currently running inside.
    pub fn current() -> Result<Self, ScopeError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(ScopeError::NoRuntime)
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl From<Handle> for Dispatcher {
    fn from(handle: Handle) -> Self {
        Self::from_handle(handle)
    }
}
