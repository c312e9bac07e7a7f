use std::time::Duration;

use super::engine::Interval;
use super::error::IntervalError;
use crate::scope::Dispatcher;

/// Builder for [`Interval`]. Obtain one from [`Interval::builder`] or
/// [`Interval::unbounded`].
#[derive(Debug, Clone)]
pub struct IntervalBuilder {
    end: i64,
    period: Duration,
    start: i64,
    initial_delay: Duration,
    dispatcher: Option<Dispatcher>,
}

impl IntervalBuilder {
    pub fn new(end: i64, period: Duration) -> Self {
        Self {
            end,
            period,
            start: 0,
            initial_delay: Duration::ZERO,
            dispatcher: None,
        }
    }

    /// Counter value on `start()`. A `start` above `end` makes the interval
    /// count down.
    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Delay before the first tick (default: none).
    pub fn initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Runtime to tick on (default: the runtime calling `build`).
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<Interval, IntervalError> {
        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Dispatcher::current()?,
        };
        Ok(Interval::from_parts(
            self.end,
            self.start,
            self.period,
            self.initial_delay,
            dispatcher,
        ))
    }
}
