use std::io::Write;
use std::path::Path;

use ticktock_core::{
    Dispatcher, Interval, IntervalDefinition, IntervalError, LifecycleEvent, TimeUnit,
};

use crate::CliContext;

/// Operations that can be applied to a named interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Cancel,
    Pause,
    Resume,
    Reset,
    Switch,
}

pub async fn time_out(ctx: &CliContext, seconds: i64) {
    let name = ctx.next_name("timeout");
    let label = name.clone();
    let presets = ctx.presets().await;

    match presets.time_out(&ctx.lifecycle, seconds, move || {
        println!("[{label}] time out finished");
    }) {
        Ok(interval) => {
            println!("{name}: fires after {seconds} ticks");
            ctx.register(name, interval).await;
        }
        Err(e) => println!("Failed to create {name}: {e}"),
    }
}

pub async fn countdown(ctx: &CliContext, from: i64, period: Option<u64>) {
    let name = ctx.next_name("down");
    let period = ctx.period_or_default(period).await;
    let presets = ctx.presets().await;

    match presets.countdown(&ctx.lifecycle, from, period, printer(&name, "countdown finished")) {
        Ok(interval) => {
            println!("{name}: counting down from {from}");
            ctx.register(name, interval).await;
        }
        Err(e) => println!("Failed to create {name}: {e}"),
    }
}

pub async fn count_up(ctx: &CliContext, end: i64, period: Option<u64>) {
    let name = ctx.next_name("up");
    let period = ctx.period_or_default(period).await;
    let presets = ctx.presets().await;

    match presets.count_up(&ctx.lifecycle, end, period, printer(&name, "interval finished")) {
        Ok(interval) => {
            println!("{name}: counting up to {end}");
            ctx.register(name, interval).await;
        }
        Err(e) => println!("Failed to create {name}: {e}"),
    }
}

pub async fn poll(ctx: &CliContext, period: Option<u64>) {
    let name = ctx.next_name("poll");
    let label = name.clone();
    let period = ctx.period_or_default(period).await;
    let presets = ctx.presets().await;

    match presets.poll(period, move |tick| println!("[{label}] {tick}")) {
        Ok(interval) => {
            println!("{name}: polling until cancelled");
            ctx.register(name, interval).await;
        }
        Err(e) => println!("Failed to create {name}: {e}"),
    }
}

/// Load a definition file as an idle, lifecycle-bound interval.
pub async fn load(ctx: &CliContext, name: &str, path: &Path) {
    let definition = match IntervalDefinition::load(path) {
        Ok(definition) => definition,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let interval = match Dispatcher::current()
        .map_err(IntervalError::from)
        .and_then(|dispatcher| definition.into_interval(dispatcher))
    {
        Ok(interval) => interval,
        Err(e) => {
            println!("Failed to create {name}: {e}");
            return;
        }
    };

    let life_event = ctx.config.read().await.life_event;
    let label = name.to_string();
    let finished = name.to_string();
    interval
        .life(&ctx.lifecycle, life_event)
        .subscribe(move |_, tick| println!("[{label}] {tick}"))
        .finish(move |_, tick| println!("[{finished}] finished at {tick}"));

    println!("{name}: loaded from {} (idle, use `start {name}`)", path.display());
    ctx.register(name.to_string(), interval).await;
}

pub async fn control(ctx: &CliContext, name: &str, action: Action) {
    let Some(interval) = ctx.interval(name).await else {
        println!("No interval named {name}");
        return;
    };

    match action {
        Action::Start => {
            interval.start();
        }
        Action::Stop => interval.stop(),
        Action::Cancel => interval.cancel(),
        Action::Pause => interval.pause(),
        Action::Resume => interval.resume(),
        Action::Reset => interval.reset(),
        Action::Switch => interval.switch(),
    }

    println!("{name}: {} (count {})", interval.state(), interval.count());
}

pub async fn list(ctx: &CliContext) {
    let intervals = ctx.intervals().await;
    if intervals.is_empty() {
        println!("No intervals");
        return;
    }

    println!("{:<16} {:<8} {:>8} {:>8} {:>10}", "Name", "State", "Count", "End", "Period");
    println!("{}", "-".repeat(54));
    for (name, interval) in intervals {
        let end = if interval.never_ends() {
            "never".to_string()
        } else {
            interval.end().to_string()
        };
        println!(
            "{:<16} {:<8} {:>8} {:>8} {:>10?}",
            name,
            interval.state().to_string(),
            interval.count(),
            end,
            interval.period()
        );
    }
}

pub fn emit(ctx: &CliContext, event: LifecycleEvent) {
    ctx.lifecycle.emit(event);
    println!("emitted {event}");
}

/// Tear the session down the way a closing screen would: stopped, then destroyed.
pub fn destroy(ctx: &CliContext) {
    emit(ctx, LifecycleEvent::Stopped);
    emit(ctx, LifecycleEvent::Destroyed);
}

pub async fn show_config(ctx: &CliContext) {
    let config = ctx.config.read().await;
    println!("default period: {}", config.default_period);
    println!("unit:           {:?}", config.unit);
    println!("life event:     {}", config.life_event);
}

pub async fn update_config(
    ctx: &CliContext,
    period: Option<u64>,
    unit: Option<TimeUnit>,
    life_event: Option<LifecycleEvent>,
) {
    let snapshot = {
        let mut config = ctx.config.write().await;
        if let Some(period) = period {
            config.default_period = period;
        }
        if let Some(unit) = unit {
            config.unit = unit;
        }
        if let Some(life_event) = life_event {
            config.life_event = life_event;
        }
        config.clone()
    };

    if let Err(e) = snapshot.save() {
        println!("Failed to save config: {e}");
    }
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").expect("error exiting");
    std::io::stdout().flush().expect("error flushing stdout");
}

pub fn parse_event(value: &str) -> Result<LifecycleEvent, String> {
    match value.to_ascii_lowercase().as_str() {
        "created" => Ok(LifecycleEvent::Created),
        "started" => Ok(LifecycleEvent::Started),
        "resumed" => Ok(LifecycleEvent::Resumed),
        "paused" => Ok(LifecycleEvent::Paused),
        "stopped" => Ok(LifecycleEvent::Stopped),
        "destroyed" => Ok(LifecycleEvent::Destroyed),
        other => Err(format!("unknown lifecycle event '{other}'")),
    }
}

pub fn parse_unit(value: &str) -> Result<TimeUnit, String> {
    match value.to_ascii_lowercase().as_str() {
        "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
        "s" | "secs" | "seconds" => Ok(TimeUnit::Seconds),
        "m" | "mins" | "minutes" => Ok(TimeUnit::Minutes),
        other => Err(format!("unknown time unit '{other}'")),
    }
}

/// Callback that prints each tick and a message on the final one.
fn printer(name: &str, done: &'static str) -> impl Fn(&Interval, i64) + Send + Sync + 'static {
    let name = name.to_string();
    move |interval, tick| {
        if interval.is_end(tick) {
            println!("[{name}] {done}");
        } else {
            println!("[{name}] {tick}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use std::time::Duration;
    use ticktock_core::IntervalState;

    #[test]
    fn parses_events_case_insensitively() {
        assert_eq!(parse_event("Stopped"), Ok(LifecycleEvent::Stopped));
        assert_eq!(parse_event("destroyed"), Ok(LifecycleEvent::Destroyed));
        assert!(parse_event("gone").is_err());
    }

    #[test]
    fn parses_unit_aliases() {
        assert_eq!(parse_unit("ms"), Ok(TimeUnit::Milliseconds));
        assert_eq!(parse_unit("seconds"), Ok(TimeUnit::Seconds));
        assert_eq!(parse_unit("m"), Ok(TimeUnit::Minutes));
        assert!(parse_unit("weeks").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_cancels_bound_presets_but_not_polls() {
        let ctx = CliContext::with_config(CliConfig::default());
        countdown(&ctx, 10, Some(1)).await;
        poll(&ctx, Some(1)).await;

        tokio::time::sleep(Duration::from_millis(1500)).await;
        destroy(&ctx);

        let states: Vec<_> = ctx
            .intervals()
            .await
            .into_iter()
            .map(|(name, interval)| (name, interval.state()))
            .collect();
        assert_eq!(
            states,
            vec![
                ("down-1".to_string(), IntervalState::Idle),
                ("poll-2".to_string(), IntervalState::Active),
            ]
        );

        ctx.cancel_all().await;
        assert!(ctx.intervals().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn control_applies_actions_by_name() {
        let ctx = CliContext::with_config(CliConfig::default());
        poll(&ctx, Some(1)).await;

        control(&ctx, "poll-1", Action::Pause).await;
        let interval = ctx.interval("poll-1").await.unwrap();
        assert_eq!(interval.state(), IntervalState::Paused);

        control(&ctx, "poll-1", Action::Switch).await;
        assert_eq!(interval.state(), IntervalState::Active);

        control(&ctx, "poll-1", Action::Stop).await;
        assert_eq!(interval.state(), IntervalState::Idle);
    }
}
