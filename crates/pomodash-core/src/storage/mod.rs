pub mod config;
pub mod snapshot;

pub use config::ConfigStorage;
pub use snapshot::{SnapshotStorage, TimerSnapshot};

use std::path::PathBuf;

use crate::{Error, Result};

pub fn get_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("pomodash"))
        .ok_or(Error::NoDataDir("data"))
}

pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("pomodash"))
        .ok_or(Error::NoDataDir("config"))
}

pub fn init_data_dir() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

pub fn init_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}
