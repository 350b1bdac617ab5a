//! Periodic tick source
//!
//! Drives a [`TimerEngine`] from a tokio interval. A late tick is delivered
//! late and missed ticks are not replayed, so the countdown follows ticks, not
//! wall-clock time.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::engine::TimerEngine;

#[derive(Debug, Clone, Copy)]
pub struct TickSource {
    period: Duration,
}

/// Owner of a running tick loop.
///
/// Dropping the handle cancels the loop; [`shutdown`](Self::shutdown) also
/// waits for it, after which no more ticks can reach the engine.
pub struct TickHandle {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking `engine`. The first tick lands one period from now.
    pub fn spawn(&self, engine: Arc<TimerEngine>) -> TickHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!("Tick loop started ({:?})", period);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        engine.tick().await;
                    }
                }
            }
            tracing::debug!("Tick loop stopped");
        });

        TickHandle {
            token,
            handle: Some(handle),
        }
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickHandle {
    /// Cancel the loop and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!("Tick loop panicked: {}", e);
            }
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodash_core::models::{CycleConfig, TimerMode};
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    fn engine() -> Arc<TimerEngine> {
        let (tx, _) = broadcast::channel(100);
        Arc::new(TimerEngine::new(CycleConfig::default(), tx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let engine = engine();
        engine.start().await;

        let handle = TickSource::default().spawn(engine.clone());
        sleep(Duration::from_millis(3500)).await;

        assert_eq!(engine.get_state().await.remaining_seconds, 1497);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_while_paused() {
        let engine = engine();
        let handle = TickSource::default().spawn(engine.clone());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(engine.get_state().await.remaining_seconds, 1500);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_shutdown() {
        let engine = engine();
        engine.start().await;

        let handle = TickSource::default().spawn(engine.clone());
        sleep(Duration::from_millis(2500)).await;
        handle.shutdown().await;

        let stopped_at = engine.get_state().await;
        sleep(Duration::from_secs(60)).await;
        assert_eq!(engine.get_state().await, stopped_at);
        assert_eq!(stopped_at.remaining_seconds, 1498);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let engine = engine();
        engine.start().await;

        let handle = TickSource::default().spawn(engine.clone());
        sleep(Duration::from_millis(1500)).await;
        drop(handle);

        // Let the loop observe the cancellation
        sleep(Duration::from_millis(10)).await;
        let after_drop = engine.get_state().await;
        sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.get_state().await, after_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_clock_runs_full_session() {
        let config = CycleConfig {
            focus_seconds: 5,
            ..CycleConfig::default()
        };
        let (tx, _) = broadcast::channel(100);
        let engine = Arc::new(TimerEngine::new(config, tx));
        engine.start().await;

        let handle = TickSource::from_millis(10).spawn(engine.clone());
        sleep(Duration::from_millis(55)).await;
        handle.shutdown().await;

        let state = engine.get_state().await;
        assert_eq!(state.mode, TimerMode::ShortBreak);
        assert_eq!(state.completed_focus_sessions, 1);
        // Natural completion keeps running into the break
        assert_eq!(state.remaining_seconds, 300);
    }
}
