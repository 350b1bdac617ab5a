use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{CycleConfig, SessionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

/// Snapshot of a running pomodoro. Only [`IntervalTimer`] produces new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub completed_focus_sessions: u32,
}

/// A phase change caused by a countdown reaching zero or by a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TimerMode,
    pub to: TimerMode,
    pub completed_focus_sessions: u32,
}

/// Result of feeding one clock tick into the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Timer is paused, nothing changed
    Idle,
    Counted { remaining_seconds: u64 },
    Completed(Transition),
}

/// Countdown and phase-transition logic for a single pomodoro session.
///
/// The timer does not own a clock. Whoever drives it calls [`tick`](Self::tick)
/// once per elapsed second; a late or missing tick simply delays the
/// countdown and is never compensated for.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    config: CycleConfig,
    state: TimerState,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [
        TimerMode::Focus,
        TimerMode::ShortBreak,
        TimerMode::LongBreak,
    ];

    pub fn duration(&self, config: &CycleConfig) -> u64 {
        match self {
            TimerMode::Focus => config.focus_seconds,
            TimerMode::ShortBreak => config.short_break_seconds,
            TimerMode::LongBreak => config.long_break_seconds,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus Time",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, TimerMode::Focus)
    }

    pub fn is_break(&self) -> bool {
        !self.is_focus()
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" | "pomodoro" | "work" => Ok(TimerMode::Focus),
            "short_break" | "short-break" | "shortbreak" | "short" => Ok(TimerMode::ShortBreak),
            "long_break" | "long-break" | "longbreak" | "long" => Ok(TimerMode::LongBreak),
            other => Err(Error::InvalidArgument(format!(
                "Unknown timer mode '{}'. Must be one of: focus, short_break, long_break",
                other
            ))),
        }
    }
}

impl TryFrom<u8> for TimerMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        TimerMode::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("Timer mode out of range: {}", value)))
    }
}

/// Render a second count as zero-padded `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

impl TimerState {
    /// Fresh state: paused at the start of the first focus session
    pub fn new(config: &CycleConfig) -> Self {
        Self {
            mode: TimerMode::Focus,
            remaining_seconds: TimerMode::Focus.duration(config),
            is_running: false,
            completed_focus_sessions: 0,
        }
    }
}

impl IntervalTimer {
    pub fn new(config: CycleConfig) -> Self {
        Self {
            state: TimerState::new(&config),
            config,
        }
    }

    /// Rebuild a timer from a saved state. The restored timer is always paused.
    pub fn restore(config: CycleConfig, mut state: TimerState) -> Result<Self> {
        let nominal = state.mode.duration(&config);
        if state.remaining_seconds > nominal {
            return Err(Error::InvalidData(format!(
                "Remaining time {}s exceeds {} duration of {}s",
                state.remaining_seconds,
                state.mode.as_str(),
                nominal
            )));
        }

        state.is_running = false;
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.state.completed_focus_sessions
    }

    pub fn nominal_duration(&self) -> u64 {
        self.state.mode.duration(&self.config)
    }

    /// Returns `false` if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.state.is_running {
            return false;
        }
        self.state.is_running = true;
        true
    }

    /// Returns `false` if the timer was already paused.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.state.is_running = false;
        true
    }

    /// Flip between running and paused, returning the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
        self.state.is_running
    }

    /// Consume one clock tick.
    ///
    /// At most one completion transition happens per tick: the countdown
    /// stops at zero and the new phase starts counting on the next tick.
    pub fn tick(&mut self) -> Tick {
        if !self.state.is_running {
            return Tick::Idle;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);

        if self.state.remaining_seconds == 0 {
            Tick::Completed(self.complete_phase())
        } else {
            Tick::Counted {
                remaining_seconds: self.state.remaining_seconds,
            }
        }
    }

    /// End the current phase now. The next phase is always left paused.
    pub fn skip(&mut self) -> Transition {
        let transition = self.complete_phase();
        self.state.is_running = false;
        transition
    }

    /// Rewind the current phase to its full length and pause.
    pub fn reset(&mut self) {
        self.state.remaining_seconds = self.nominal_duration();
        self.state.is_running = false;
    }

    /// Jump straight to `mode`, paused at its full length. The focus count is
    /// not touched, and switching to the current mode still rewinds it.
    pub fn switch_mode(&mut self, mode: TimerMode) {
        self.state.mode = mode;
        self.state.remaining_seconds = mode.duration(&self.config);
        self.state.is_running = false;
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::compute(&self.state, &self.config)
    }

    /// Remaining time as `MM:SS`
    pub fn display_time(&self) -> String {
        format_clock(self.state.remaining_seconds)
    }

    /// How far through the current phase we are, 0.0 to 100.0
    pub fn progress_percent(&self) -> f64 {
        let nominal = self.nominal_duration();
        if nominal == 0 {
            return 0.0;
        }
        let elapsed = nominal.saturating_sub(self.state.remaining_seconds);
        elapsed as f64 / nominal as f64 * 100.0
    }

    // Leaves `is_running` alone; callers decide whether the next phase runs.
    fn complete_phase(&mut self) -> Transition {
        let from = self.state.mode;

        let to = match from {
            TimerMode::Focus => {
                self.state.completed_focus_sessions =
                    self.state.completed_focus_sessions.saturating_add(1);

                let cadence = self.config.sessions_before_long_break;
                if cadence != 0 && self.state.completed_focus_sessions % cadence == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
        };

        self.state.mode = to;
        self.state.remaining_seconds = to.duration(&self.config);

        Transition {
            from,
            to,
            completed_focus_sessions: self.state.completed_focus_sessions,
        }
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(CycleConfig::default())
    }
}
