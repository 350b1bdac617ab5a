//! Configuration manager

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use pomodash_core::{
    models::{Config, CycleConfig},
    storage::{init_config_dir, ConfigStorage},
    Result as CoreResult,
};

/// Config manager error
#[derive(Debug, thiserror::Error)]
pub enum ConfigManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] pomodash_core::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigManagerError>;

/// Manages application configuration
pub struct ConfigManager {
    storage: ConfigStorage,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load from the platform config directory
    pub fn new() -> CoreResult<Self> {
        let config_dir = init_config_dir()?;
        Self::with_dir(config_dir)
    }

    /// Load from an explicit directory, creating default config there if needed
    pub fn with_dir(config_dir: PathBuf) -> CoreResult<Self> {
        let storage = ConfigStorage::new(config_dir);
        let config = storage.load()?;

        Ok(Self {
            storage,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub async fn get(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn update(&self, config: Config) -> Result<Config> {
        config
            .validate()
            .map_err(|e| ConfigManagerError::Invalid(e.to_string()))?;

        self.storage.save(&config)?;

        {
            let mut current = self.config.write().await;
            *current = config.clone();
        }

        tracing::debug!("Configuration updated");
        Ok(config)
    }

    /// Takes effect for timers created after the update
    pub async fn update_timer_config(&self, timer: CycleConfig) -> Result<Config> {
        let mut config = self.get().await;
        config.timer = timer;
        self.update(config).await
    }

    pub async fn update_daemon_config(
        &self,
        log_level: Option<String>,
        tick_interval_ms: Option<u64>,
        autosave: Option<bool>,
    ) -> Result<Config> {
        let mut config = self.get().await;

        if let Some(level) = log_level {
            config.daemon.log_level = level;
        }
        if let Some(interval) = tick_interval_ms {
            config.daemon.tick_interval_ms = interval;
        }
        if let Some(enabled) = autosave {
            config.daemon.autosave = enabled;
        }

        self.update(config).await
    }

    pub async fn reset_to_defaults(&self) -> Result<Config> {
        self.update(Config::default()).await
    }
}
