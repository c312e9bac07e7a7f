//! Lifecycle signals that cancel dependent work
//!
//! Anything that can say "this scope ended" implements [`LifecycleSource`].
//! Scopes and intervals only ever depend on that trait; [`Lifecycle`] is a
//! plain host-driven implementation for applications without their own
//! lifecycle framework.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Lifecycle events a host can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Destroyed,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Resumed => "resumed",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Callback registered with a [`LifecycleSource`]. Returns `false` once it
/// no longer needs events; the source may then drop it.
pub type LifecycleObserver = Arc<dyn Fn(LifecycleEvent) -> bool + Send + Sync>;

/// A source of lifecycle events that observers can subscribe to.
pub trait LifecycleSource {
    /// Register `observer` to be called for every subsequent event.
    fn observe(&self, observer: LifecycleObserver);
}

impl<T: LifecycleSource + ?Sized> LifecycleSource for Arc<T> {
    fn observe(&self, observer: LifecycleObserver) {
        (**self).observe(observer)
    }
}

/// Host-driven lifecycle: call [`Lifecycle::emit`] when the owning screen,
/// session or component changes state.
///
/// Observers are dropped once [`LifecycleEvent::Destroyed`] has been emitted,
/// and individually after any event they answer with `false`.
#[derive(Default)]
pub struct Lifecycle {
    observers: Mutex<Vec<LifecycleObserver>>,
}

impl Lifecycle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `event` to every observer, in registration order.
    pub fn emit(&self, event: LifecycleEvent) {
        // Snapshot so observers may register further observers while running
        let observers = {
            let mut guard = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
            if event == LifecycleEvent::Destroyed {
                std::mem::take(&mut *guard)
            } else {
                guard.clone()
            }
        };

        tracing::debug!(%event, observers = observers.len(), "lifecycle event");

        let finished: Vec<_> = observers
            .into_iter()
            .filter(|observer| !observer(event))
            .collect();
        if finished.is_empty() || event == LifecycleEvent::Destroyed {
            return;
        }

        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|observer| !finished.iter().any(|done| Arc::ptr_eq(observer, done)));
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl LifecycleSource for Lifecycle {
    fn observe(&self, observer: LifecycleObserver) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn observers_receive_events_in_order() {
        let lifecycle = Lifecycle::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..2 {
            let seen = seen.clone();
            lifecycle.observe(Arc::new(move |event: LifecycleEvent| {
                seen.lock().unwrap().push((id, event));
                true
            }));
        }

        lifecycle.emit(LifecycleEvent::Stopped);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, LifecycleEvent::Stopped), (1, LifecycleEvent::Stopped)]
        );
    }

    #[test]
    fn destroyed_releases_observers() {
        let lifecycle = Lifecycle::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        lifecycle.observe(Arc::new(move |_: LifecycleEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));

        lifecycle.emit(LifecycleEvent::Destroyed);
        assert_eq!(lifecycle.observer_count(), 0);

        lifecycle.emit(LifecycleEvent::Stopped);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finished_observers_are_pruned() {
        let lifecycle = Lifecycle::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        lifecycle.observe(Arc::new(move |_: LifecycleEvent| {
            counter.fetch_add(1, Ordering::SeqCst) == 0
        }));
        lifecycle.observe(Arc::new(|_: LifecycleEvent| true));

        lifecycle.emit(LifecycleEvent::Started);
        assert_eq!(lifecycle.observer_count(), 2);

        lifecycle.emit(LifecycleEvent::Stopped);
        assert_eq!(lifecycle.observer_count(), 1);

        lifecycle.emit(LifecycleEvent::Stopped);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
