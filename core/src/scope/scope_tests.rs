//! Tests for Scope launch/cancel semantics and handler routing

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::lifecycle::{Lifecycle, LifecycleEvent};

use super::{Dispatcher, Scope, ScopeError, scope};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
enum Outcome {
    Normal,
    Cancelled(Option<String>),
    Failed,
    Panicked(String),
}

fn outcome_of(err: Option<&ScopeError>) -> Outcome {
    match err {
        None => Outcome::Normal,
        Some(ScopeError::Cancelled { reason }) => Outcome::Cancelled(reason.clone()),
        Some(ScopeError::Failed(_)) => Outcome::Failed,
        Some(ScopeError::Panicked { message }) => Outcome::Panicked(message.clone()),
        Some(ScopeError::NoRuntime(_)) => unreachable!("runtime is present in tests"),
    }
}

/// Scope whose `finally` forwards the outcome into a channel
fn recording_scope() -> (Scope, mpsc::UnboundedReceiver<Outcome>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let scope = Scope::new(Dispatcher::current().unwrap());
    scope.finally(move |_, err| {
        let _ = tx.send(outcome_of(err));
    });
    (scope, rx)
}

async fn forever() -> Result<(), ScopeError> {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Completion
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_finally_runs_after_normal_completion() {
    let (scope, mut rx) = recording_scope();
    scope.launch(async { Ok(()) });

    assert_eq!(rx.recv().await, Some(Outcome::Normal));
    assert!(!scope.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_error_goes_to_catch_then_finally() {
    let (scope, mut rx) = recording_scope();
    let caught = Arc::new(AtomicUsize::new(0));
    let counter = caught.clone();
    scope.catch(move |_, err| {
        assert!(matches!(err, ScopeError::Failed(_)));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    scope.launch(async { Err(ScopeError::failed("boom")) });

    assert_eq!(rx.recv().await, Some(Outcome::Failed));
    assert_eq!(caught.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panic_is_routed_not_propagated() {
    let (scope, mut rx) = recording_scope();
    scope.catch(|_, _| {});
    scope.launch(async { panic!("tick exploded") });

    assert_eq!(
        rx.recv().await,
        Some(Outcome::Panicked("tick exploded".to_string()))
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_work_without_catch() {
    let (scope, mut rx) = recording_scope();
    let caught = Arc::new(AtomicUsize::new(0));
    let counter = caught.clone();
    scope.catch(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    scope.launch(forever());
    assert!(scope.is_active());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    scope.cancel_with("screen closed");

    assert_eq!(
        rx.recv().await,
        Some(Outcome::Cancelled(Some("screen closed".to_string())))
    );
    assert_eq!(caught.load(Ordering::SeqCst), 0);
    assert!(scope.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent() {
    let (scope, mut rx) = recording_scope();
    scope.launch(forever());

    scope.cancel();
    scope.cancel_with("ignored");
    scope.close();

    assert_eq!(rx.recv().await, Some(Outcome::Cancelled(None)));

    // finally fires exactly once
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_is_noop() {
    let (scope, mut rx) = recording_scope();
    scope.launch(async { Ok(()) });
    assert_eq!(rx.recv().await, Some(Outcome::Normal));

    scope.cancel();
    assert!(!scope.is_cancelled());
}

#[tokio::test(start_paused = true)]
#[should_panic(expected = "scope already has a job")]
async fn test_second_launch_is_a_programming_error() {
    let scope = Scope::new(Dispatcher::current().unwrap());
    scope.launch(async { Ok(()) });
    scope.launch(async { Ok(()) });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_finally_waits_for_cancelled_work_to_stop() {
    let done = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (started_tx, started_rx) = oneshot::channel();

    let scope = Scope::new(Dispatcher::current().unwrap());
    let seen = done.clone();
    scope.finally(move |_, _| {
        let _ = tx.send(seen.load(Ordering::SeqCst));
    });

    let flag = done.clone();
    scope.launch(async move {
        tokio::task::yield_now().await;
        let _ = started_tx.send(());
        // Blocking section: abort can only land at the next await
        std::thread::sleep(Duration::from_millis(300));
        flag.store(true, Ordering::SeqCst);
        forever().await
    });

    started_rx.await.unwrap();
    scope.cancel();

    assert_eq!(rx.recv().await, Some(true));
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle binding & reporting
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_lifecycle_event_cancels_scope() {
    let lifecycle = Lifecycle::new();
    let (scope, mut rx) = recording_scope();
    scope.bind_lifecycle(&lifecycle, LifecycleEvent::Stopped);
    scope.launch(forever());

    lifecycle.emit(LifecycleEvent::Paused);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(scope.is_active(), "unrelated events must not cancel");

    lifecycle.emit(LifecycleEvent::Stopped);
    assert_eq!(lifecycle.observer_count(), 0, "fired binding is released");
    lifecycle.emit(LifecycleEvent::Stopped);

    assert_eq!(rx.recv().await, Some(Outcome::Cancelled(None)));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_with_lifecycle_defaults_to_destroyed() {
    let lifecycle = Lifecycle::new();
    let scope = Scope::with_lifecycle(Dispatcher::current().unwrap(), &lifecycle);
    scope.launch(forever());

    lifecycle.emit(LifecycleEvent::Stopped);
    assert!(scope.is_active());

    lifecycle.emit(LifecycleEvent::Destroyed);
    assert!(scope.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_report_keeps_work_running() {
    let caught = Arc::new(AtomicUsize::new(0));
    let counter = caught.clone();
    let running = scope(Dispatcher::current().unwrap(), forever());
    running.catch(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    running.report(&ScopeError::Panicked { message: "subscriber".into() });
    running.report(&ScopeError::Panicked { message: "subscriber".into() });

    assert_eq!(caught.load(Ordering::SeqCst), 2);
    assert!(running.is_active());
    running.cancel();
}

#[test]
fn test_dispatcher_requires_runtime() {
    let err = Dispatcher::current().unwrap_err();
    assert!(matches!(err, ScopeError::NoRuntime(_)));
}
