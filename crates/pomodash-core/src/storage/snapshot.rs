//! Timer snapshot persistence
//!
//! A single `timer.json` holding the last known [`TimerState`]. Loading is
//! lenient about absence: no file (or an empty one) just means "start fresh".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{models::TimerState, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub saved_at: DateTime<Utc>,
}

impl TimerSnapshot {
    pub fn new(state: TimerState) -> Self {
        Self {
            state,
            saved_at: Utc::now(),
        }
    }
}

pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path(&self) -> PathBuf {
        self.data_dir.join("timer.json")
    }

    pub fn load(&self) -> Result<Option<TimerSnapshot>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: TimerSnapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    /// Write to a temp file and rename it over `timer.json`, so a reader
    /// never sees a half-written snapshot.
    pub fn save(&self, state: &TimerState) -> Result<TimerSnapshot> {
        std::fs::create_dir_all(&self.data_dir)?;

        let snapshot = TimerSnapshot::new(*state);
        let content = serde_json::to_string_pretty(&snapshot)?;

        let tmp_path = self.data_dir.join("timer.json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(tmp_path, self.path())?;

        Ok(snapshot)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CycleConfig, IntervalTimer, TimerMode};
    use crate::Error;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());

        let mut timer = IntervalTimer::default();
        timer.skip();
        timer.start();
        timer.tick();

        let saved = storage.save(timer.state()).unwrap();
        let loaded = storage.load().unwrap().expect("snapshot should exist");

        assert_eq!(loaded, saved);
        assert_eq!(loaded.state.mode, TimerMode::ShortBreak);
        assert_eq!(loaded.state.remaining_seconds, 299);
        assert_eq!(loaded.state.completed_focus_sessions, 1);

        let restored = IntervalTimer::restore(CycleConfig::default(), loaded.state).unwrap();
        assert_eq!(restored.remaining_seconds(), 299);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());

        storage.save(IntervalTimer::default().state()).unwrap();
        storage.save(IntervalTimer::default().state()).unwrap();

        assert!(temp_dir.path().join("timer.json").exists());
        assert!(!temp_dir.path().join("timer.json.tmp").exists());
    }

    #[test]
    fn test_save_replaces_truncated_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("timer.json"), r#"{"state": {"mode": "fo"#).unwrap();

        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());
        assert!(storage.load().is_err());

        storage.save(IntervalTimer::default().state()).unwrap();
        let loaded = storage.load().unwrap().expect("snapshot should exist");
        assert_eq!(loaded.state.remaining_seconds, 1500);
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());

        storage.save(IntervalTimer::default().state()).unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());

        // Clearing twice is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("timer.json"), "{ not json").unwrap();

        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());
        assert!(matches!(storage.load(), Err(Error::Json(_))));
    }
}
