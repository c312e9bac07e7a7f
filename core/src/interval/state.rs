use std::fmt;

/// Lifecycle state of an [`Interval`](super::Interval)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntervalState {
    /// Not running. Initial state, and the state after stop/cancel/completion.
    #[default]
    Idle,
    /// Ticking.
    Active,
    /// Suspended by `pause()`, waiting for `resume()`.
    Paused,
}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Active => f.write_str("active"),
            Self::Paused => f.write_str("paused"),
        }
    }
}
