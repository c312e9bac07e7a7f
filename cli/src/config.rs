//! Persisted CLI settings
//!
//! Stored with confy under the `ticktock` application name; missing or
//! unreadable files fall back to defaults.

use serde::{Deserialize, Serialize};
use ticktock_core::serde_defaults::{default_life_event, default_period};
use ticktock_core::{LifecycleEvent, TimeUnit};

const APP_NAME: &str = "ticktock";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Period used when a command doesn't pass `--period`
    #[serde(default = "default_period")]
    pub default_period: u64,

    /// Unit for all periods typed at the prompt
    #[serde(default)]
    pub unit: TimeUnit,

    /// Lifecycle event that cancels bound intervals
    #[serde(default = "default_life_event")]
    pub life_event: LifecycleEvent,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_period: default_period(),
            unit: TimeUnit::default(),
            life_event: default_life_event(),
        }
    }
}

impl CliConfig {
    pub fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load config, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }
}
