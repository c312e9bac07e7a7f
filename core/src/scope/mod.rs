//! Cancellable scopes
//!
//! A [`Scope`] owns exactly one unit of asynchronous work and the
//! cancellation token that stops it. Errors and panics raised by the work
//! are routed to the scope's `catch` handler instead of the caller, and a
//! `finally` handler observes how the work ended.
//!
//! # Lifecycle
//!
//! 1. `Scope::new(dispatcher)` creates the token (optionally bound to a
//!    [`LifecycleSource`] event)
//! 2. `launch(work)` spawns the work on the dispatcher
//! 3. The work finishes, fails, panics or is cancelled → `catch` (for
//!    failures) then `finally` run exactly once

mod dispatcher;
mod error;

#[cfg(test)]
mod scope_tests;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::lifecycle::{LifecycleEvent, LifecycleSource};

pub use dispatcher::Dispatcher;
pub use error::{BoxError, ScopeError};

/// Error handler: receives the scope and the error it caught
pub type CatchHandler = Arc<dyn Fn(&Scope, &ScopeError) + Send + Sync>;

/// Completion handler: `None` when the work returned normally
pub type FinallyHandler = Arc<dyn Fn(&Scope, Option<&ScopeError>) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    catch: Option<CatchHandler>,
    finally: Option<FinallyHandler>,
}

struct ScopeInner {
    dispatcher: Dispatcher,
    token: CancellationToken,
    launched: AtomicBool,
    finished: AtomicBool,
    reason: Mutex<Option<String>>,
    handlers: Mutex<Handlers>,
}

/// Handle to a cancellable unit of work. Clones share the same work.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                dispatcher,
                token: CancellationToken::new(),
                launched: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                reason: Mutex::new(None),
                handlers: Mutex::new(Handlers::default()),
            }),
        }
    }

    /// Create a scope that cancels itself when `source` emits
    /// [`LifecycleEvent::Destroyed`].
    pub fn with_lifecycle<S>(dispatcher: Dispatcher, source: &S) -> Self
    where
        S: LifecycleSource + ?Sized,
    {
        let scope = Self::new(dispatcher);
        scope.bind_lifecycle(source, LifecycleEvent::Destroyed);
        scope
    }

    /// Start `work` under this scope's cancellation token.
    ///
    /// # Panics
    ///
    /// A scope runs a single job; launching a second one is a programming
    /// error.
    pub fn launch<F>(&self, work: F) -> &Self
    where
        F: Future<Output = Result<(), ScopeError>> + Send + 'static,
    {
        let already = self.inner.launched.swap(true, Ordering::SeqCst);
        assert!(!already, "scope already has a job: {self:?}");

        let scope = self.clone();
        let mut job = self.inner.dispatcher.spawn(work);

        self.inner.dispatcher.spawn(async move {
            let token = scope.inner.token.clone();
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    job.abort();
                    // Wait for the work to actually stop before running `finally`
                    match (&mut job).await {
                        Err(err) if err.is_panic() => Err(ScopeError::from_panic(err.into_panic())),
                        _ => Err(ScopeError::Cancelled { reason: scope.reason() }),
                    }
                }
                joined = &mut job => match joined {
                    Ok(result) => result,
                    Err(err) if err.is_panic() => Err(ScopeError::from_panic(err.into_panic())),
                    Err(_) => Err(ScopeError::Cancelled { reason: scope.reason() }),
                },
            };
            scope.complete(outcome);
        });

        self
    }

    /// Cancel the running work. No-op if already cancelled or finished.
    pub fn cancel(&self) {
        self.cancel_inner(None);
    }

    /// Cancel with a reason that is reported to `finally`.
    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.cancel_inner(Some(reason.into()));
    }

    fn cancel_inner(&self, reason: Option<String>) {
        if self.inner.token.is_cancelled() || self.inner.finished.load(Ordering::SeqCst) {
            return;
        }
        if let Some(reason) = reason {
            *lock(&self.inner.reason) = Some(reason);
        }
        tracing::trace!(reason = ?self.reason(), "cancelling scope");
        self.inner.token.cancel();
    }

    /// Equivalent to [`Scope::cancel`].
    pub fn close(&self) {
        self.cancel();
    }

    /// Set the error handler. Without one, errors are logged and swallowed.
    pub fn catch<F>(&self, handler: F) -> &Self
    where
        F: Fn(&Scope, &ScopeError) + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).catch = Some(Arc::new(handler));
        self
    }

    pub(crate) fn catch_shared(&self, handler: CatchHandler) -> &Self {
        lock(&self.inner.handlers).catch = Some(handler);
        self
    }

    /// Set the completion handler, run once after the work ends for any reason.
    pub fn finally<F>(&self, handler: F) -> &Self
    where
        F: Fn(&Scope, Option<&ScopeError>) + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).finally = Some(Arc::new(handler));
        self
    }

    /// Cancel this scope (once) when `source` emits `event`.
    pub fn bind_lifecycle<S>(&self, source: &S, event: LifecycleEvent) -> &Self
    where
        S: LifecycleSource + ?Sized,
    {
        let weak = Arc::downgrade(&self.inner);
        let fired = AtomicBool::new(false);
        source.observe(Arc::new(move |emitted: LifecycleEvent| {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if emitted != event {
                return !fired.load(Ordering::SeqCst);
            }
            if fired.swap(true, Ordering::SeqCst) {
                return false;
            }
            tracing::debug!(%event, "lifecycle cancelled scope");
            Scope { inner }.cancel();
            false
        }));
        self
    }

    /// Route a non-fatal error to the error handler without ending the work.
    pub fn report(&self, err: &ScopeError) {
        let handler = lock(&self.inner.handlers).catch.clone();
        match handler {
            Some(handler) => handler(self, err),
            None => tracing::warn!(error = %err, "unhandled error in scope"),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Launched, not finished and not cancelled.
    pub fn is_active(&self) -> bool {
        self.inner.launched.load(Ordering::SeqCst)
            && !self.inner.finished.load(Ordering::SeqCst)
            && !self.inner.token.is_cancelled()
    }

    fn reason(&self) -> Option<String> {
        lock(&self.inner.reason).clone()
    }

    fn complete(&self, outcome: Result<(), ScopeError>) {
        self.inner.finished.store(true, Ordering::SeqCst);
        let error = outcome.err();

        if let Some(err) = &error
            && !err.is_cancelled()
        {
            self.report(err);
        }

        let finally = lock(&self.inner.handlers).finally.clone();
        if let Some(finally) = finally {
            finally(self, error.as_ref());
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("launched", &self.inner.launched.load(Ordering::SeqCst))
            .field("finished", &self.inner.finished.load(Ordering::SeqCst))
            .field("cancelled", &self.inner.token.is_cancelled())
            .finish()
    }
}

/// Create a scope on `dispatcher` and launch `work` in it.
pub fn scope<F>(dispatcher: Dispatcher, work: F) -> Scope
where
    F: Future<Output = Result<(), ScopeError>> + Send + 'static,
{
    let scope = Scope::new(dispatcher);
    scope.launch(work);
    scope
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
