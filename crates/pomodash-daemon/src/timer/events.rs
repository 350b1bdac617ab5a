//! Timer events

use chrono::{DateTime, Utc};
use pomodash_core::models::{TimerMode, TimerState, Transition};
use serde::{Deserialize, Serialize};

/// Event emitted after every change to the timer.
///
/// Each event carries the full state as it stood right after the change, so
/// an observer can render from the event alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerEvent {
    pub event_type: TimerEventType,
    pub session_id: String,
    pub state: TimerState,
    pub timestamp: DateTime<Utc>,
}

/// Types of timer events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventType {
    /// Countdown resumed
    Started,
    /// Countdown paused
    Paused,
    /// One second counted down
    Tick,
    /// A phase ran out or was skipped
    PhaseCompleted {
        phase: TimerMode,
        completed_focus_sessions: u32,
    },
    /// The timer moved into a new phase
    PhaseChanged { new_phase: TimerMode },
    /// The user skipped the rest of the phase
    Skipped,
    /// Current phase rewound to full length
    Reset,
    /// Direct jump to a mode
    ModeSwitched { mode: TimerMode },
    /// State loaded from a snapshot
    Restored,
}

impl TimerEvent {
    /// Create a new timer event
    pub fn new(event_type: TimerEventType, session_id: String, state: TimerState) -> Self {
        Self {
            event_type,
            session_id,
            state,
            timestamp: Utc::now(),
        }
    }

    /// The completed/changed pair that follows a transition
    pub fn transition(
        session_id: &str,
        transition: &Transition,
        state: TimerState,
    ) -> [Self; 2] {
        [
            Self::new(
                TimerEventType::PhaseCompleted {
                    phase: transition.from,
                    completed_focus_sessions: transition.completed_focus_sessions,
                },
                session_id.to_string(),
                state,
            ),
            Self::new(
                TimerEventType::PhaseChanged {
                    new_phase: transition.to,
                },
                session_id.to_string(),
                state,
            ),
        ]
    }

    pub fn is_tick(&self) -> bool {
        matches!(self.event_type, TimerEventType::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodash_core::models::IntervalTimer;

    #[test]
    fn test_timer_event_creation() {
        let state = *IntervalTimer::default().state();
        let event = TimerEvent::new(TimerEventType::Started, "session1".to_string(), state);

        assert_eq!(event.session_id, "session1");
        assert_eq!(event.state.remaining_seconds, 1500);
        assert!(!event.is_tick());
    }

    #[test]
    fn test_transition_events() {
        let mut timer = IntervalTimer::default();
        let transition = timer.skip();

        let [completed, changed] = TimerEvent::transition("s", &transition, *timer.state());
        assert_eq!(
            completed.event_type,
            TimerEventType::PhaseCompleted {
                phase: TimerMode::Focus,
                completed_focus_sessions: 1,
            }
        );
        assert_eq!(
            changed.event_type,
            TimerEventType::PhaseChanged {
                new_phase: TimerMode::ShortBreak
            }
        );
    }

    #[test]
    fn test_event_serialization() {
        let state = *IntervalTimer::default().state();
        let event = TimerEvent::new(
            TimerEventType::ModeSwitched {
                mode: TimerMode::LongBreak,
            },
            "session1".to_string(),
            state,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"]["type"], "mode_switched");
        assert_eq!(json["event_type"]["mode"], "long_break");
        assert_eq!(json["state"]["mode"], "focus");
    }
}
