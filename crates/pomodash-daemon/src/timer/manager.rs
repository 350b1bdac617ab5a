//! Timer manager - owns the engine, its tick loop and snapshot autosave

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use pomodash_core::models::{CycleConfig, TimerState};
use pomodash_core::storage::{SnapshotStorage, TimerSnapshot};

use super::clock::{TickHandle, TickSource};
use super::engine::TimerEngine;
use super::events::{TimerEvent, TimerEventType};

/// Timer manager error
#[derive(Debug, thiserror::Error)]
pub enum TimerManagerError {
    #[error("Tick loop already running")]
    AlreadyTicking,

    #[error("Timer manager has been shut down")]
    ShutDown,

    #[error("Storage error: {0}")]
    Storage(#[from] pomodash_core::Error),
}

pub type Result<T> = std::result::Result<T, TimerManagerError>;

/// One timer session: the engine, the clock feeding it, and optional
/// persistence of its state.
pub struct TimerManager {
    engine: Arc<TimerEngine>,
    /// Event broadcast channel
    event_tx: broadcast::Sender<TimerEvent>,
    tick_source: TickSource,
    ticks: Mutex<Option<TickHandle>>,
    storage: Option<Arc<SnapshotStorage>>,
    autosave: bool,
    autosave_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    /// Set when the engine came from a snapshot; announced once by `run`
    restored: AtomicBool,
}

impl TimerManager {
    /// Create a manager around a fresh timer
    pub fn new(config: CycleConfig, tick_source: TickSource) -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        let engine = Arc::new(TimerEngine::new(config, event_tx.clone()));
        Self::from_engine(engine, event_tx, tick_source, None)
    }

    /// Create a manager that resumes from the snapshot in `storage`, if any.
    ///
    /// A snapshot that cannot be read, or that no longer fits `config` (for
    /// example after the phase lengths were shortened), is discarded and the
    /// timer starts fresh.
    pub fn restore(config: CycleConfig, tick_source: TickSource, storage: SnapshotStorage) -> Self {
        let (event_tx, _) = broadcast::channel(1000);

        let mut restored = false;
        let engine = match storage.load() {
            Ok(Some(snapshot)) => {
                match TimerEngine::restore(config, snapshot.state, event_tx.clone()) {
                    Ok(engine) => {
                        tracing::info!(
                            "Restored timer from snapshot saved at {}",
                            snapshot.saved_at
                        );
                        restored = true;
                        engine
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring saved timer state: {}", e);
                        TimerEngine::new(config, event_tx.clone())
                    }
                }
            }
            Ok(None) => {
                tracing::debug!("No timer snapshot found, starting fresh");
                TimerEngine::new(config, event_tx.clone())
            }
            Err(e) => {
                tracing::warn!("Unreadable timer snapshot, starting fresh: {}", e);
                TimerEngine::new(config, event_tx.clone())
            }
        };

        let manager = Self::from_engine(
            Arc::new(engine),
            event_tx,
            tick_source,
            Some(Arc::new(storage)),
        );
        manager.restored.store(restored, Ordering::Release);
        manager
    }

    fn from_engine(
        engine: Arc<TimerEngine>,
        event_tx: broadcast::Sender<TimerEvent>,
        tick_source: TickSource,
        storage: Option<Arc<SnapshotStorage>>,
    ) -> Self {
        Self {
            engine,
            event_tx,
            tick_source,
            ticks: Mutex::new(None),
            storage,
            autosave: true,
            autosave_task: Mutex::new(None),
            shutdown: CancellationToken::new(),
            restored: AtomicBool::new(false),
        }
    }

    /// Attach snapshot storage to a manager built with [`new`](Self::new)
    pub fn with_storage(mut self, storage: SnapshotStorage) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    pub fn engine(&self) -> Arc<TimerEngine> {
        self.engine.clone()
    }

    /// Subscribe to timer events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticks.lock().await.is_some()
    }

    /// Start the tick loop and, when storage is attached, the autosave task.
    pub async fn run(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(TimerManagerError::ShutDown);
        }

        let mut ticks = self.ticks.lock().await;
        if ticks.is_some() {
            return Err(TimerManagerError::AlreadyTicking);
        }
        *ticks = Some(self.tick_source.spawn(self.engine.clone()));
        drop(ticks);

        if self.autosave {
            if let Some(storage) = self.storage.clone() {
                let task = Self::spawn_autosave(storage, self.subscribe(), self.shutdown.clone());
                *self.autosave_task.lock().await = Some(task);
            }
        }

        // Subscribers made before `run` see where the timer picked up from
        if self.restored.swap(false, Ordering::AcqRel) {
            self.engine.notify_restored().await;
        }

        tracing::info!(
            "Timer session {} ticking every {:?}",
            self.engine.session_id(),
            self.tick_source.period()
        );
        Ok(())
    }

    fn spawn_autosave(
        storage: Arc<SnapshotStorage>,
        mut rx: broadcast::Receiver<TimerEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    received = rx.recv() => received,
                };

                match received {
                    Ok(event) => {
                        if !should_autosave(&event) {
                            continue;
                        }
                        if let Err(e) = storage.save(&event.state) {
                            tracing::warn!("Failed to save timer snapshot: {}", e);
                        } else {
                            tracing::debug!("Saved timer snapshot ({:?})", event.state.mode);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Autosave lagged behind by {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Write the current state to storage now
    pub async fn save_snapshot(&self) -> Result<Option<TimerSnapshot>> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        let state = self.engine.get_state().await;
        Ok(Some(storage.save(&state)?))
    }

    /// Stop ticking and autosaving, then persist the final state.
    ///
    /// Once this returns no tick can reach the engine any more.
    pub async fn shutdown(&self) -> Result<TimerState> {
        self.shutdown.cancel();

        let ticks = self.ticks.lock().await.take();
        if let Some(ticks) = ticks {
            ticks.shutdown().await;
        }
        let autosave_task = self.autosave_task.lock().await.take();
        if let Some(task) = autosave_task {
            let _ = task.await;
        }

        let state = self.engine.get_state().await;
        if self.autosave {
            self.save_snapshot().await?;
        }

        tracing::info!(
            "Timer session {} stopped with {} focus sessions completed",
            self.engine.session_id(),
            state.completed_focus_sessions
        );
        Ok(state)
    }
}

/// Ticks are too frequent to save, and a restore has nothing new to write
fn should_autosave(event: &TimerEvent) -> bool {
    !event.is_tick() && event.event_type != TimerEventType::Restored
}
