//! Interval definitions
//!
//! Definitions are TOML documents describing an interval's parameters, so
//! hosts can keep timer settings in config files:
//!
//! ```toml
//! end = 0
//! start = 10
//! period = 500
//! unit = "milliseconds"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::engine::{Interval, NEVER_ENDS};
use super::error::IntervalError;
use super::unit::TimeUnit;
use crate::scope::Dispatcher;
use crate::serde_defaults::{default_end, default_period};

/// Parameters of an interval, as stored in config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalDefinition {
    /// Final count (-1 = never ends)
    #[serde(default = "default_end")]
    pub end: i64,

    /// Count on start; above `end` means counting down
    #[serde(default)]
    pub start: i64,

    /// Time between ticks, in `unit`
    #[serde(default = "default_period")]
    pub period: u64,

    /// Time before the first tick, in `unit`
    #[serde(default)]
    pub initial_delay: u64,

    #[serde(default)]
    pub unit: TimeUnit,
}

impl IntervalDefinition {
    pub fn from_toml_str(source: &str) -> Result<Self, IntervalError> {
        Self::parse(source, "<inline>")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IntervalError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| IntervalError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, &path.display().to_string())
    }

    fn parse(source: &str, origin: &str) -> Result<Self, IntervalError> {
        let definition: Self = toml::from_str(source).map_err(|source| IntervalError::ParseToml {
            origin: origin.to_string(),
            source,
        })?;
        definition.validate(origin)?;
        Ok(definition)
    }

    fn validate(&self, origin: &str) -> Result<(), IntervalError> {
        let invalid = |reason: &str| IntervalError::InvalidDefinition {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        if self.period == 0 {
            return Err(invalid("period must be greater than zero"));
        }
        if self.end < NEVER_ENDS {
            return Err(invalid("end must be -1 (never) or a non-negative count"));
        }
        Ok(())
    }

    /// Build an idle interval from this definition.
    pub fn into_interval(&self, dispatcher: Dispatcher) -> Result<Interval, IntervalError> {
        Interval::builder(self.end, self.unit.duration(self.period))
            .start(self.start)
            .initial_delay(self.unit.duration(self.initial_delay))
            .dispatcher(dispatcher)
            .build()
    }
}
