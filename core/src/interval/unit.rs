use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit that whole-number periods and delays are expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// `amount` of this unit as a [`Duration`].
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Seconds => Duration::from_secs(amount),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
        }
    }
}
