//! Derived session statistics

use serde::{Deserialize, Serialize};

use super::{CycleConfig, TimerState};

/// Read-only numbers computed from the focus count. Never stored, so it
/// cannot go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub completed_focus_sessions: u32,
    pub total_focus_minutes: u64,
    pub long_breaks_taken: u32,
}

impl SessionStats {
    pub fn compute(state: &TimerState, config: &CycleConfig) -> Self {
        let completed = state.completed_focus_sessions;

        Self {
            completed_focus_sessions: completed,
            total_focus_minutes: u64::from(completed) * config.focus_seconds / 60,
            long_breaks_taken: completed
                .checked_div(config.sessions_before_long_break)
                .unwrap_or(0),
        }
    }
}
