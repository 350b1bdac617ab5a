//! Pomodash Daemon Library
//!
//! Async runtime around the interval timer, exposed as a library for testing.

pub mod command;
pub mod config;
pub mod observer;
pub mod timer;

pub use command::{Command, ConfigChange, Reply};
pub use config::ConfigManager;
pub use timer::{TickHandle, TickSource, TimerEngine, TimerEvent, TimerManager};
