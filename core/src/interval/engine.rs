//! The interval state machine
//!
//! An [`Interval`] counts from `start` towards `end`, one step per tick,
//! notifying subscribers on every tick and finish callbacks when it
//! completes or is stopped.
//!
//! ```text
//!            start()                 pause()
//!   Idle ───────────────▶ Active ───────────────▶ Paused
//!    ▲                     │  ▲                     │
//!    │ stop()/cancel()/    │  └──── resume() ───────┘
//!    │ count == end        │
//!    └─────────────────────┘   (stop()/cancel() from Paused → Idle)
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::time::Instant;

use super::builder::IntervalBuilder;
use super::state::IntervalState;
use super::ticker::FixedDelayTicker;
use crate::lifecycle::{LifecycleEvent, LifecycleSource};
use crate::scope::{CatchHandler, Dispatcher, Scope, ScopeError};

/// `end` value meaning "never completes on its own"
pub const NEVER_ENDS: i64 = -1;

/// Per-tick and finish callback: receives the interval and the current count
pub type TickCallback = Arc<dyn Fn(&Interval, i64) + Send + Sync>;

/// Error handler for panics raised by tick and finish callbacks
pub type ErrorCallback = Arc<dyn Fn(&Interval, &ScopeError) + Send + Sync>;

struct Shared {
    count: i64,
    state: IntervalState,
    subscribers: Vec<TickCallback>,
    finishers: Vec<TickCallback>,
    on_error: Option<ErrorCallback>,
    /// Delay before the first tick after `resume()`
    pending_delay: Duration,
    last_tick: Instant,
    /// Bumped whenever `start()` or `reset()` re-seeds the count
    generation: u64,
    /// Present and running iff `state == Active`
    scope: Option<Scope>,
}

struct IntervalInner {
    end: i64,
    start: i64,
    period: Duration,
    initial_delay: Duration,
    countdown: bool,
    dispatcher: Dispatcher,
    shared: Mutex<Shared>,
}

/// A cancellable, pausable periodic counter.
///
/// Cloning is cheap and every clone controls the same interval.
#[derive(Clone)]
pub struct Interval {
    inner: Arc<IntervalInner>,
}

impl Interval {
    /// Start building an interval that completes when the count reaches `end`.
    /// Pass [`NEVER_ENDS`] for an interval that only stops when told to.
    pub fn builder(end: i64, period: Duration) -> IntervalBuilder {
        IntervalBuilder::new(end, period)
    }

    /// Start building an interval that never completes on its own.
    pub fn unbounded(period: Duration) -> IntervalBuilder {
        IntervalBuilder::new(NEVER_ENDS, period)
    }

    pub(super) fn from_parts(
        end: i64,
        start: i64,
        period: Duration,
        initial_delay: Duration,
        dispatcher: Dispatcher,
    ) -> Self {
        let countdown = end != NEVER_ENDS && start > end;
        Self {
            inner: Arc::new(IntervalInner {
                end,
                start,
                period,
                initial_delay,
                countdown,
                dispatcher,
                shared: Mutex::new(Shared {
                    count: start,
                    state: IntervalState::Idle,
                    subscribers: Vec::new(),
                    finishers: Vec::new(),
                    on_error: None,
                    pending_delay: initial_delay,
                    last_tick: Instant::now(),
                    generation: 0,
                    scope: None,
                }),
            }),
        }
    }

    // ─── Callbacks ──────────────────────────────────────────────────────────

    /// Called on every tick. On the final tick this runs before the finish
    /// callbacks, with the same count.
    pub fn subscribe<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Interval, i64) + Send + Sync + 'static,
    {
        self.lock().subscribers.push(Arc::new(callback));
        self
    }

    /// Called when the interval reaches `end` or is stopped with [`Interval::stop`].
    /// [`Interval::cancel`] does not call it.
    pub fn finish<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Interval, i64) + Send + Sync + 'static,
    {
        self.lock().finishers.push(Arc::new(callback));
        self
    }

    /// Handle panics raised by callbacks. Without a handler they are logged
    /// and the interval keeps ticking.
    pub fn catch<F>(&self, handler: F) -> &Self
    where
        F: Fn(&Interval, &ScopeError) + Send + Sync + 'static,
    {
        self.lock().on_error = Some(Arc::new(handler));
        self
    }

    /// Cancel the interval whenever `source` emits `event`.
    pub fn life<S>(&self, source: &S, event: LifecycleEvent) -> &Self
    where
        S: LifecycleSource + ?Sized,
    {
        let weak = Arc::downgrade(&self.inner);
        source.observe(Arc::new(move |emitted: LifecycleEvent| {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if emitted == event {
                tracing::debug!(%event, "lifecycle cancelled interval");
                Interval { inner }.cancel();
            }
            true
        }));
        self
    }

    // ─── Operations ─────────────────────────────────────────────────────────

    /// Start counting from `start`. Ignored while already active; restarts
    /// from scratch when paused.
    pub fn start(&self) -> &Self {
        {
            let mut shared = self.lock();
            if shared.state == IntervalState::Active {
                tracing::trace!("start ignored: already active");
                return self;
            }
            shared.state = IntervalState::Active;
            shared.count = self.inner.start;
            shared.generation += 1;
            self.launch(&mut shared, self.inner.initial_delay);
        }
        tracing::debug!(start = self.inner.start, end = self.inner.end, "interval started");
        self
    }

    /// Stop and call the finish callbacks with the current count.
    pub fn stop(&self) {
        let (count, finishers, scope) = {
            let mut shared = self.lock();
            if shared.state == IntervalState::Idle {
                tracing::trace!("stop ignored: idle");
                return;
            }
            let scope = shared.scope.take();
            if let Some(scope) = &scope {
                scope.cancel();
            }
            shared.state = IntervalState::Idle;
            (shared.count, shared.finishers.clone(), scope)
        };
        tracing::debug!(count, "interval stopped");
        self.notify(&finishers, count, scope.as_ref());
    }

    /// Stop without calling the finish callbacks.
    pub fn cancel(&self) {
        let mut shared = self.lock();
        if shared.state == IntervalState::Idle {
            tracing::trace!("cancel ignored: idle");
            return;
        }
        if let Some(scope) = shared.scope.take() {
            scope.cancel();
        }
        shared.state = IntervalState::Idle;
        tracing::debug!(count = shared.count, "interval cancelled");
    }

    /// Same as [`Interval::cancel`].
    pub fn close(&self) {
        self.cancel();
    }

    /// Active → stop, Idle → start, Paused → resume.
    pub fn switch(&self) {
        let state = self.state();
        match state {
            IntervalState::Active => self.stop(),
            IntervalState::Idle => {
                self.start();
            }
            IntervalState::Paused => self.resume(),
        }
    }

    /// Suspend ticking, remembering how long it has been since the last tick.
    pub fn pause(&self) {
        let mut shared = self.lock();
        if shared.state != IntervalState::Active {
            tracing::trace!(state = %shared.state, "pause ignored");
            return;
        }
        if let Some(scope) = shared.scope.take() {
            scope.cancel();
        }
        shared.state = IntervalState::Paused;
        shared.pending_delay = shared.last_tick.elapsed();
        tracing::debug!(count = shared.count, pending = ?shared.pending_delay, "interval paused");
    }

    /// Continue a paused interval; the next tick fires after the delay
    /// recorded by [`Interval::pause`].
    pub fn resume(&self) {
        let mut shared = self.lock();
        if shared.state != IntervalState::Paused {
            tracing::trace!(state = %shared.state, "resume ignored");
            return;
        }
        shared.state = IntervalState::Active;
        let delay = shared.pending_delay;
        self.launch(&mut shared, delay);
        tracing::debug!(count = shared.count, delay = ?delay, "interval resumed");
    }

    /// Put the count back to `start` without changing state. An active
    /// interval restarts its ticking immediately.
    pub fn reset(&self) {
        let mut shared = self.lock();
        shared.count = self.inner.start;
        shared.generation += 1;
        shared.pending_delay = self.inner.initial_delay;
        if let Some(scope) = shared.scope.take() {
            scope.cancel();
        }
        if shared.state == IntervalState::Active {
            self.launch(&mut shared, self.inner.initial_delay);
        }
        tracing::debug!(state = %shared.state, "interval reset");
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn count(&self) -> i64 {
        self.lock().count
    }

    pub fn state(&self) -> IntervalState {
        self.lock().state
    }

    pub fn end(&self) -> i64 {
        self.inner.end
    }

    /// The value the count starts from (and returns to on reset).
    pub fn start_value(&self) -> i64 {
        self.inner.start
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    pub fn initial_delay(&self) -> Duration {
        self.inner.initial_delay
    }

    pub fn is_countdown(&self) -> bool {
        self.inner.countdown
    }

    pub fn never_ends(&self) -> bool {
        self.inner.end == NEVER_ENDS
    }

    /// Whether `tick` is the final value this interval produces.
    pub fn is_end(&self, tick: i64) -> bool {
        !self.never_ends() && tick == self.inner.end
    }

    #[cfg(test)]
    pub(super) fn holds_scope(&self) -> bool {
        self.lock().scope.is_some()
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn launch(&self, shared: &mut Shared, delay: Duration) {
        let scope = Scope::new(self.inner.dispatcher.clone());
        scope.catch_shared(error_forwarder(Arc::downgrade(&self.inner)));

        shared.last_tick = Instant::now();
        shared.scope = Some(scope.clone());

        let interval = self.clone();
        let runner = scope.clone();
        scope.launch(async move {
            interval.run(runner, delay).await;
            Ok(())
        });
    }

    async fn run(self, scope: Scope, first_delay: Duration) {
        let mut ticker = FixedDelayTicker::new(first_delay, self.inner.period, scope.token());
        while ticker.tick().await {
            if !self.on_tick(&scope) {
                break;
            }
        }
    }

    /// One tick. Returns whether the loop should keep going.
    fn on_tick(&self, scope: &Scope) -> bool {
        let (count, generation, subscribers) = {
            let shared = self.lock();
            if scope.is_cancelled() {
                return false;
            }
            (shared.count, shared.generation, shared.subscribers.clone())
        };

        tracing::trace!(count, "tick");
        self.notify(&subscribers, count, Some(scope));

        let finishers = {
            let mut shared = self.lock();
            // A subscriber called start() or reset(); the count belongs to the new run
            if shared.generation != generation {
                return false;
            }
            // pause() or stop() from a subscriber still consumes the delivered value
            let cancelled = scope.is_cancelled();
            if !self.is_end(count) {
                shared.count = if self.inner.countdown { count - 1 } else { count + 1 };
                shared.last_tick = Instant::now();
                return !cancelled;
            }
            // stop() and cancel() already ended this run
            if cancelled && shared.state == IntervalState::Idle {
                return false;
            }
            scope.cancel();
            shared.scope = None;
            shared.state = IntervalState::Idle;
            shared.finishers.clone()
        };

        tracing::debug!(count, "interval completed");
        self.notify(&finishers, count, Some(scope));
        false
    }

    fn notify(&self, callbacks: &[TickCallback], count: i64, scope: Option<&Scope>) {
        for callback in callbacks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(self, count)));
            if let Err(payload) = outcome {
                let err = ScopeError::from_panic(payload);
                match scope {
                    Some(scope) => scope.report(&err),
                    None => self.handle_error(&err),
                }
            }
        }
    }

    fn handle_error(&self, err: &ScopeError) {
        let handler = self.lock().on_error.clone();
        match handler {
            Some(handler) => handler(self, err),
            None => tracing::warn!(error = %err, "interval callback failed"),
        }
    }
}

/// Scope error handler that forwards to the interval's own handler.
fn error_forwarder(weak: Weak<IntervalInner>) -> CatchHandler {
    Arc::new(move |_: &Scope, err: &ScopeError| {
        if let Some(inner) = weak.upgrade() {
            Interval { inner }.handle_error(err);
        }
    })
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("Interval")
            .field("start", &self.inner.start)
            .field("end", &self.inner.end)
            .field("period", &self.inner.period)
            .field("count", &shared.count)
            .field("state", &shared.state)
            .finish()
    }
}
