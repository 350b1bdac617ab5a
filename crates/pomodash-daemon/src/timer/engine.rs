use pomodash_core::models::{
    CycleConfig, IntervalTimer, SessionStats, Tick, TimerMode, TimerState, Transition,
};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use super::events::{TimerEvent, TimerEventType};

/// Async front for an [`IntervalTimer`].
///
/// Commands and ticks all go through the same write lock, so they are applied
/// one at a time in arrival order. Events are sent while the lock is still
/// held, which keeps the event stream in the same order as the mutations.
pub struct TimerEngine {
    timer: Arc<RwLock<IntervalTimer>>,
    event_tx: broadcast::Sender<TimerEvent>,
    session_id: String,
}

impl TimerEngine {
    pub fn new(config: CycleConfig, event_tx: broadcast::Sender<TimerEvent>) -> Self {
        Self::from_timer(IntervalTimer::new(config), event_tx)
    }

    /// Resume from a saved state. Fails if the state does not fit `config`.
    ///
    /// Nothing is emitted here; call [`notify_restored`](Self::notify_restored)
    /// once observers have subscribed.
    pub fn restore(
        config: CycleConfig,
        state: TimerState,
        event_tx: broadcast::Sender<TimerEvent>,
    ) -> pomodash_core::Result<Self> {
        let timer = IntervalTimer::restore(config, state)?;
        Ok(Self::from_timer(timer, event_tx))
    }

    fn from_timer(timer: IntervalTimer, event_tx: broadcast::Sender<TimerEvent>) -> Self {
        Self {
            timer: Arc::new(RwLock::new(timer)),
            event_tx,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub async fn get_state(&self) -> TimerState {
        *self.timer.read().await.state()
    }

    /// Copy of the whole timer, for display helpers
    pub async fn get_timer(&self) -> IntervalTimer {
        self.timer.read().await.clone()
    }

    pub async fn stats(&self) -> SessionStats {
        self.timer.read().await.stats()
    }

    pub async fn start(&self) -> bool {
        let mut timer = self.timer.write().await;
        let changed = timer.start();
        if changed {
            self.emit(TimerEventType::Started, &timer);
        }
        changed
    }

    pub async fn pause(&self) -> bool {
        let mut timer = self.timer.write().await;
        let changed = timer.pause();
        if changed {
            self.emit(TimerEventType::Paused, &timer);
        }
        changed
    }

    /// Returns the new running flag
    pub async fn toggle(&self) -> bool {
        let mut timer = self.timer.write().await;
        let running = timer.toggle();
        let event_type = if running {
            TimerEventType::Started
        } else {
            TimerEventType::Paused
        };
        self.emit(event_type, &timer);
        running
    }

    pub async fn tick(&self) -> Tick {
        let mut timer = self.timer.write().await;
        let outcome = timer.tick();

        match outcome {
            Tick::Idle => {}
            Tick::Counted { .. } => self.emit(TimerEventType::Tick, &timer),
            Tick::Completed(transition) => {
                tracing::info!(
                    "{} finished, moving to {} (completed sessions: {})",
                    transition.from,
                    transition.to,
                    transition.completed_focus_sessions
                );
                self.emit_transition(&transition, &timer);
            }
        }

        outcome
    }

    pub async fn skip(&self) -> Transition {
        let mut timer = self.timer.write().await;
        let transition = timer.skip();

        tracing::info!("Skipped {}, now in {}", transition.from, transition.to);
        self.emit(TimerEventType::Skipped, &timer);
        self.emit_transition(&transition, &timer);

        transition
    }

    pub async fn reset(&self) {
        let mut timer = self.timer.write().await;
        timer.reset();
        self.emit(TimerEventType::Reset, &timer);
    }

    pub async fn switch_mode(&self, mode: TimerMode) {
        let mut timer = self.timer.write().await;
        timer.switch_mode(mode);
        self.emit(TimerEventType::ModeSwitched { mode }, &timer);
    }

    /// Tell subscribers the timer was resumed from a saved state
    pub async fn notify_restored(&self) {
        let timer = self.timer.read().await;
        self.emit(TimerEventType::Restored, &timer);
    }

    fn emit(&self, event_type: TimerEventType, timer: &IntervalTimer) {
        let event = TimerEvent::new(event_type, self.session_id.clone(), *timer.state());
        let _ = self.event_tx.send(event);
    }

    fn emit_transition(&self, transition: &Transition, timer: &IntervalTimer) {
        for event in TimerEvent::transition(&self.session_id, transition, *timer.state()) {
            let _ = self.event_tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (TimerEngine, broadcast::Receiver<TimerEvent>) {
        let (tx, rx) = broadcast::channel(100);
        (TimerEngine::new(CycleConfig::default(), tx), rx)
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let (engine, _rx) = engine();
        let state = engine.get_state().await;

        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.remaining_seconds, 1500);
        assert!(!state.is_running);
        assert!(!engine.session_id().is_empty());
    }

    #[tokio::test]
    async fn test_start_pause_events() {
        let (engine, mut rx) = engine();

        assert!(engine.start().await);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, TimerEventType::Started);
        assert!(event.state.is_running);

        // Already running: no event
        assert!(!engine.start().await);

        assert!(engine.pause().await);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, TimerEventType::Paused);
        assert!(!event.state.is_running);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tick_while_paused_emits_nothing() {
        let (engine, mut rx) = engine();

        assert_eq!(engine.tick().await, Tick::Idle);
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.get_state().await.remaining_seconds, 1500);
    }

    #[tokio::test]
    async fn test_tick_events() {
        let (engine, mut rx) = engine();
        engine.start().await;
        let _ = rx.recv().await;

        engine.tick().await;
        let event = rx.recv().await.unwrap();
        assert!(event.is_tick());
        assert_eq!(event.state.remaining_seconds, 1499);
    }

    #[tokio::test]
    async fn test_ticks_through_focus_session() {
        let (tx, mut rx) = broadcast::channel(4000);
        let engine = TimerEngine::new(CycleConfig::default(), tx);
        engine.start().await;

        for _ in 0..1500 {
            engine.tick().await;
        }

        let state = engine.get_state().await;
        assert_eq!(state.mode, TimerMode::ShortBreak);
        assert_eq!(state.remaining_seconds, 300);
        assert_eq!(state.completed_focus_sessions, 1);
        assert!(state.is_running);

        let mut completions = 0;
        while let Ok(event) = rx.try_recv() {
            if let TimerEventType::PhaseCompleted { phase, .. } = event.event_type {
                assert_eq!(phase, TimerMode::Focus);
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[tokio::test]
    async fn test_skip_events_and_pause() {
        let (engine, mut rx) = engine();
        engine.start().await;
        let _ = rx.recv().await;

        let transition = engine.skip().await;
        assert_eq!(transition.to, TimerMode::ShortBreak);
        assert!(!engine.get_state().await.is_running);

        let kinds: Vec<_> = (0..3).map(|_| rx.try_recv().unwrap().event_type).collect();
        assert_eq!(
            kinds,
            vec![
                TimerEventType::Skipped,
                TimerEventType::PhaseCompleted {
                    phase: TimerMode::Focus,
                    completed_focus_sessions: 1,
                },
                TimerEventType::PhaseChanged {
                    new_phase: TimerMode::ShortBreak
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_and_switch_mode() {
        let (engine, _rx) = engine();
        engine.skip().await;
        engine.start().await;
        engine.tick().await;

        engine.reset().await;
        let state = engine.get_state().await;
        assert_eq!(state.mode, TimerMode::ShortBreak);
        assert_eq!(state.remaining_seconds, 300);
        assert!(!state.is_running);

        engine.switch_mode(TimerMode::LongBreak).await;
        let state = engine.get_state().await;
        assert_eq!(state.mode, TimerMode::LongBreak);
        assert_eq!(state.remaining_seconds, 900);
        assert_eq!(state.completed_focus_sessions, 1);
    }

    #[tokio::test]
    async fn test_toggle() {
        let (engine, mut rx) = engine();

        assert!(engine.toggle().await);
        assert_eq!(rx.recv().await.unwrap().event_type, TimerEventType::Started);
        assert!(!engine.toggle().await);
        assert_eq!(rx.recv().await.unwrap().event_type, TimerEventType::Paused);
    }

    #[tokio::test]
    async fn test_restore_announced_on_request() {
        let (tx, mut rx) = broadcast::channel(10);
        let state = TimerState {
            mode: TimerMode::ShortBreak,
            remaining_seconds: 42,
            is_running: true,
            completed_focus_sessions: 3,
        };

        let engine = TimerEngine::restore(CycleConfig::default(), state, tx).unwrap();
        assert!(rx.try_recv().is_err());

        engine.notify_restored().await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, TimerEventType::Restored);
        assert_eq!(event.state.remaining_seconds, 42);
        assert!(!engine.get_state().await.is_running);
        assert_eq!(engine.stats().await.total_focus_minutes, 75);
    }

    #[tokio::test]
    async fn test_concurrent_skips_are_serialized() {
        let (tx, _rx) = broadcast::channel(100);
        let engine = Arc::new(TimerEngine::new(CycleConfig::default(), tx));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.skip().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Eight skips from fresh always land on the same state
        let state = engine.get_state().await;
        assert_eq!(state.completed_focus_sessions, 4);
        assert_eq!(state.mode, TimerMode::Focus);
    }
}
