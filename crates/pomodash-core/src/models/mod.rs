pub mod config;
pub mod stats;
pub mod timer;

pub use config::{Config, CycleConfig, DaemonConfig};
pub use stats::SessionStats;
pub use timer::{format_clock, IntervalTimer, Tick, TimerMode, TimerState, Transition};
