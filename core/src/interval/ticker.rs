//! Fixed-delay tick source

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Produces ticks with fixed-delay semantics: the first tick fires after
/// `first_delay`, every later tick `period` after the previous call to
/// [`FixedDelayTicker::tick`] returned control, so a slow tick body pushes
/// the whole cadence back.
#[derive(Debug)]
pub struct FixedDelayTicker {
    next_delay: Duration,
    period: Duration,
    token: CancellationToken,
}

impl FixedDelayTicker {
    pub fn new(first_delay: Duration, period: Duration, token: CancellationToken) -> Self {
        Self {
            next_delay: first_delay,
            period,
            token,
        }
    }

    /// Wait for the next tick. Returns `false` once the token is cancelled.
    pub async fn tick(&mut self) -> bool {
        let delay = std::mem::replace(&mut self.next_delay, self.period);
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = sleep(delay) => !self.token.is_cancelled(),
        }
    }
}
