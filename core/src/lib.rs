pub mod interval;
pub mod lifecycle;
pub mod presets;
pub mod scope;
pub mod serde_defaults;

// Re-exports for convenience
pub use interval::{
    Interval, IntervalBuilder, IntervalDefinition, IntervalError, IntervalState, NEVER_ENDS,
    TimeUnit,
};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleObserver, LifecycleSource};
pub use presets::{Presets, set_interval, set_interval_wireless, set_time_down, set_time_out};
pub use scope::{Dispatcher, Scope, ScopeError, scope};
