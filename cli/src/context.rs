use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use ticktock_core::{Interval, Lifecycle, Presets};
use tokio::sync::{Mutex, RwLock};

use crate::config::CliConfig;

/// Holds all shared state for the CLI application.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<CliConfig>>,
    /// Lifecycle the prompt session drives; bound intervals follow it
    pub lifecycle: Arc<Lifecycle>,
    intervals: Arc<Mutex<HashMap<String, Interval>>>,
    next_id: Arc<AtomicUsize>,
}

impl CliContext {
    pub fn new() -> Self {
        Self::with_config(CliConfig::load())
    }

    pub fn with_config(config: CliConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            lifecycle: Lifecycle::new(),
            intervals: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Preset constructors configured from the current settings.
    pub async fn presets(&self) -> Presets {
        let config = self.config.read().await;
        Presets::new()
            .unit(config.unit)
            .life_event(config.life_event)
    }

    /// Period to use when a command didn't give one.
    pub async fn period_or_default(&self, period: Option<u64>) -> u64 {
        match period {
            Some(period) => period,
            None => self.config.read().await.default_period,
        }
    }

    /// Generate a fresh name like `down-3`.
    pub fn next_name(&self, kind: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{kind}-{id}")
    }

    pub async fn register(&self, name: String, interval: Interval) {
        if let Some(previous) = self.intervals.lock().await.insert(name, interval) {
            previous.cancel();
        }
    }

    pub async fn interval(&self, name: &str) -> Option<Interval> {
        self.intervals.lock().await.get(name).cloned()
    }

    /// Snapshot of all named intervals, sorted by name.
    pub async fn intervals(&self) -> Vec<(String, Interval)> {
        let guard = self.intervals.lock().await;
        let mut entries: Vec<_> = guard
            .iter()
            .map(|(name, interval)| (name.clone(), interval.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Cancel and forget every interval.
    pub async fn cancel_all(&self) {
        let mut guard = self.intervals.lock().await;
        for interval in guard.values() {
            interval.cancel();
        }
        guard.clear();
    }
}
