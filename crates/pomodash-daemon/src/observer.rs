//! Logging observer
//!
//! Read-only subscriber that renders every timer event as a log line.

use pomodash_core::models::format_clock;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::timer::{TimerEvent, TimerEventType};

/// One-line status, e.g. `Focus Time 24:59 (running, 2 done)`
pub fn render_status(event: &TimerEvent) -> String {
    let state = &event.state;
    format!(
        "{} {} ({}, {} done)",
        state.mode,
        format_clock(state.remaining_seconds),
        if state.is_running { "running" } else { "paused" },
        state.completed_focus_sessions
    )
}

/// Log events until the channel closes.
pub fn spawn_log_observer(mut rx: broadcast::Receiver<TimerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Observer missed {} timer events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Log observer finished");
    })
}

fn log_event(event: &TimerEvent) {
    let status = render_status(event);
    match &event.event_type {
        TimerEventType::Tick => tracing::trace!("{}", status),
        TimerEventType::PhaseCompleted {
            phase,
            completed_focus_sessions,
        } => {
            tracing::info!(
                "{} complete ({} focus sessions so far)",
                phase,
                completed_focus_sessions
            );
        }
        TimerEventType::PhaseChanged { new_phase } => {
            tracing::info!("Now in {}: {}", new_phase, status);
        }
        other => tracing::info!("{:?}: {}", other, status),
    }
}
