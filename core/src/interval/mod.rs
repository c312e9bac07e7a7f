//! Interval engine
//!
//! This module provides:
//! - **Interval**: the periodic counter state machine (start, stop, cancel,
//!   pause, resume, reset, switch)
//! - **Builder**: construction with start value, initial delay and dispatcher
//! - **Ticker**: the fixed-delay tick source the engine runs on
//! - **Definitions**: interval parameters loaded from TOML
//!
//! # Counting
//!
//! The direction is fixed when the interval is built: with `end != -1` and
//! `start > end` it counts down, otherwise up. Each tick notifies every
//! subscriber with the current count; when the count equals `end` the
//! interval goes idle and the finish callbacks see that same count.

mod builder;
mod definition;
mod engine;
mod error;
mod state;
mod ticker;
mod unit;


pub use builder::IntervalBuilder;
pub use definition::IntervalDefinition;
pub use engine::{ErrorCallback, Interval, NEVER_ENDS, TickCallback};
pub use error::IntervalError;
pub use state::IntervalState;
pub use ticker::FixedDelayTicker;
pub use unit::TimeUnit;
