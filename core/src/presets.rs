//! Ready-made intervals for the common cases
//!
//! Each preset builds an [`Interval`], wires its callbacks, starts it and
//! hands back the handle so the caller can still pause, resume or cancel it.
//! All but [`Presets::poll`] cancel themselves when the lifecycle emits the
//! configured event ([`LifecycleEvent::Stopped`] unless overridden).

use crate::interval::{Interval, IntervalError, NEVER_ENDS, TimeUnit};
use crate::lifecycle::{LifecycleEvent, LifecycleSource};
use crate::scope::Dispatcher;
use crate::serde_defaults::default_life_event;

/// Shared settings for the preset constructors
#[derive(Debug, Clone)]
pub struct Presets {
    dispatcher: Option<Dispatcher>,
    unit: TimeUnit,
    life_event: LifecycleEvent,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            dispatcher: None,
            unit: TimeUnit::Seconds,
            life_event: default_life_event(),
        }
    }
}

impl Presets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Unit for periods passed to the presets (default: seconds).
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Lifecycle event that cancels bound presets (default: stopped).
    pub fn life_event(mut self, event: LifecycleEvent) -> Self {
        self.life_event = event;
        self
    }

    fn build(&self, end: i64, start: i64, period: u64) -> Result<Interval, IntervalError> {
        let mut builder = Interval::builder(end, self.unit.duration(period)).start(start);
        if let Some(dispatcher) = &self.dispatcher {
            builder = builder.dispatcher(dispatcher.clone());
        }
        builder.build()
    }

    /// Call `block` once, `end` units from now.
    pub fn time_out<S, F>(&self, lifecycle: &S, end: i64, block: F) -> Result<Interval, IntervalError>
    where
        S: LifecycleSource + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let interval = self.build(end, 0, 1)?;
        interval
            .life(lifecycle, self.life_event)
            .finish(move |_, _| block())
            .start();
        Ok(interval)
    }

    /// Count down from `from` to zero, one step per `period` units.
    ///
    /// `block` runs on every tick and again when the countdown finishes, so
    /// it sees zero twice; compare against [`Interval::is_end`] to tell the
    /// final call apart.
    pub fn countdown<S, F>(
        &self,
        lifecycle: &S,
        from: i64,
        period: u64,
        block: F,
    ) -> Result<Interval, IntervalError>
    where
        S: LifecycleSource + ?Sized,
        F: Fn(&Interval, i64) + Send + Sync + 'static,
    {
        let interval = self.build(0, from, period)?;
        self.report_every_tick(&interval, lifecycle, block);
        Ok(interval)
    }

    /// Count up from zero to `end`, one step per `period` units. Same
    /// callback contract as [`Presets::countdown`].
    pub fn count_up<S, F>(
        &self,
        lifecycle: &S,
        end: i64,
        period: u64,
        block: F,
    ) -> Result<Interval, IntervalError>
    where
        S: LifecycleSource + ?Sized,
        F: Fn(&Interval, i64) + Send + Sync + 'static,
    {
        let interval = self.build(end, 0, period)?;
        self.report_every_tick(&interval, lifecycle, block);
        Ok(interval)
    }

    /// Call `block` every `period` units until cancelled. Not bound to any
    /// lifecycle; the caller owns cancellation.
    pub fn poll<F>(&self, period: u64, block: F) -> Result<Interval, IntervalError>
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        let interval = self.build(NEVER_ENDS, 0, period)?;
        interval.subscribe(move |_, tick| block(tick)).start();
        Ok(interval)
    }

    fn report_every_tick<S, F>(&self, interval: &Interval, lifecycle: &S, block: F)
    where
        S: LifecycleSource + ?Sized,
        F: Fn(&Interval, i64) + Send + Sync + 'static,
    {
        let block = std::sync::Arc::new(block);
        let on_finish = block.clone();
        interval
            .life(lifecycle, self.life_event)
            .subscribe(move |interval, tick| block(interval, tick))
            .finish(move |interval, tick| on_finish(interval, tick))
            .start();
    }
}

/// [`Presets::time_out`] with default settings.
pub fn set_time_out<S, F>(lifecycle: &S, end: i64, block: F) -> Result<Interval, IntervalError>
where
    S: LifecycleSource + ?Sized,
    F: Fn() + Send + Sync + 'static,
{
    Presets::default().time_out(lifecycle, end, block)
}

/// [`Presets::countdown`] with default settings.
pub fn set_time_down<S, F>(
    lifecycle: &S,
    from: i64,
    period: u64,
    block: F,
) -> Result<Interval, IntervalError>
where
    S: LifecycleSource + ?Sized,
    F: Fn(&Interval, i64) + Send + Sync + 'static,
{
    Presets::default().countdown(lifecycle, from, period, block)
}

/// [`Presets::count_up`] with default settings.
pub fn set_interval<S, F>(
    lifecycle: &S,
    end: i64,
    period: u64,
    block: F,
) -> Result<Interval, IntervalError>
where
    S: LifecycleSource + ?Sized,
    F: Fn(&Interval, i64) + Send + Sync + 'static,
{
    Presets::default().count_up(lifecycle, end, period, block)
}

/// [`Presets::poll`] with default settings.
pub fn set_interval_wireless<F>(period: u64, block: F) -> Result<Interval, IntervalError>
where
    F: Fn(i64) + Send + Sync + 'static,
{
    Presets::default().poll(period, block)
}
