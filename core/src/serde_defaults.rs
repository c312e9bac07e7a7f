//! Common serde default value functions
//!
//! Used by interval definitions and the CLI's persisted settings.

use crate::interval::NEVER_ENDS;
use crate::lifecycle::LifecycleEvent;

/// Default `end`: run until stopped
pub fn default_end() -> i64 {
    NEVER_ENDS
}

/// Default period, in whole time units
pub fn default_period() -> u64 {
    1
}

/// Default event that cancels lifecycle-bound intervals
pub fn default_life_event() -> LifecycleEvent {
    LifecycleEvent::Stopped
}
