//! Line commands accepted by the daemon on stdin

use pomodash_core::models::{Config, TimerMode};
use std::str::FromStr;

use crate::config::ConfigManager;
use crate::timer::TimerEngine;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Try: start, pause, toggle, skip, reset, mode <focus|short|long>, status, stats, config, quit")]
    Unknown(String),

    #[error("Unknown config setting '{0}'. Try: focus, short, long, cadence, tick, autosave, log, reset")]
    UnknownSetting(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid value '{value}' for '{setting}'")]
    InvalidValue {
        setting: &'static str,
        value: String,
    },

    #[error(transparent)]
    Core(#[from] pomodash_core::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Skip,
    Reset,
    Mode(TimerMode),
    Status,
    Stats,
    Config(ConfigChange),
    Quit,
}

/// `config ...` subcommands. Changes are saved to config.json and apply
/// from the next daemon start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Show,
    FocusMinutes(u64),
    ShortBreakMinutes(u64),
    LongBreakMinutes(u64),
    SessionsBeforeLongBreak(u32),
    TickIntervalMs(u64),
    Autosave(bool),
    LogLevel(String),
    Reset,
}

/// What the caller should do after running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(String),
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "start" | "resume" => Command::Start,
            "pause" => Command::Pause,
            "toggle" | "t" => Command::Toggle,
            "skip" | "next" => Command::Skip,
            "reset" => Command::Reset,
            "mode" | "switch" => {
                let mode = words.next().ok_or(CommandError::MissingArgument("mode"))?;
                Command::Mode(mode.parse()?)
            }
            "status" | "s" => Command::Status,
            "stats" => Command::Stats,
            "config" => Command::Config(parse_config_change(words.next(), words.next())?),
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn parse_config_change(
    setting: Option<&str>,
    value: Option<&str>,
) -> Result<ConfigChange, CommandError> {
    let Some(setting) = setting else {
        return Ok(ConfigChange::Show);
    };

    let change = match setting.to_ascii_lowercase().as_str() {
        "show" => ConfigChange::Show,
        "reset" => ConfigChange::Reset,
        "focus" => ConfigChange::FocusMinutes(parse_value("focus", value)?),
        "short" => ConfigChange::ShortBreakMinutes(parse_value("short", value)?),
        "long" => ConfigChange::LongBreakMinutes(parse_value("long", value)?),
        "cadence" => ConfigChange::SessionsBeforeLongBreak(parse_value("cadence", value)?),
        "tick" => ConfigChange::TickIntervalMs(parse_value("tick", value)?),
        "autosave" => {
            let value = value.ok_or(CommandError::MissingArgument("autosave"))?;
            match value.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" => ConfigChange::Autosave(true),
                "off" | "false" | "no" => ConfigChange::Autosave(false),
                _ => {
                    return Err(CommandError::InvalidValue {
                        setting: "autosave",
                        value: value.to_string(),
                    })
                }
            }
        }
        "log" => {
            let level = value.ok_or(CommandError::MissingArgument("log"))?;
            ConfigChange::LogLevel(level.to_ascii_lowercase())
        }
        other => return Err(CommandError::UnknownSetting(other.to_string())),
    };

    Ok(change)
}

fn parse_value<T: FromStr>(setting: &'static str, value: Option<&str>) -> Result<T, CommandError> {
    let value = value.ok_or(CommandError::MissingArgument(setting))?;
    value.parse().map_err(|_| CommandError::InvalidValue {
        setting,
        value: value.to_string(),
    })
}

impl Command {
    pub async fn execute(self, engine: &TimerEngine, config: &ConfigManager) -> Reply {
        let message = match self {
            Command::Start => {
                if engine.start().await {
                    "Started".to_string()
                } else {
                    "Already running".to_string()
                }
            }
            Command::Pause => {
                if engine.pause().await {
                    "Paused".to_string()
                } else {
                    "Already paused".to_string()
                }
            }
            Command::Toggle => {
                if engine.toggle().await {
                    "Started".to_string()
                } else {
                    "Paused".to_string()
                }
            }
            Command::Skip => {
                let transition = engine.skip().await;
                format!("Skipped {}, now in {}", transition.from, transition.to)
            }
            Command::Reset => {
                engine.reset().await;
                "Reset".to_string()
            }
            Command::Mode(mode) => {
                engine.switch_mode(mode).await;
                format!("Switched to {}", mode)
            }
            Command::Status => {
                let timer = engine.get_timer().await;
                format!(
                    "{} {} [{:.0}%] {}",
                    timer.mode(),
                    timer.display_time(),
                    timer.progress_percent(),
                    if timer.is_running() { "running" } else { "paused" }
                )
            }
            Command::Stats => {
                let stats = engine.stats().await;
                format!(
                    "Focus sessions: {} | Focus minutes: {} | Long breaks: {}",
                    stats.completed_focus_sessions,
                    stats.total_focus_minutes,
                    stats.long_breaks_taken
                )
            }
            Command::Config(change) => apply_config_change(change, config).await,
            Command::Quit => return Reply::Quit,
        };

        Reply::Message(message)
    }
}

async fn apply_config_change(change: ConfigChange, manager: &ConfigManager) -> String {
    let mut timer = manager.get().await.timer;
    let result = match change {
        ConfigChange::Show => return describe_config(&manager.get().await),
        ConfigChange::Reset => manager.reset_to_defaults().await,
        ConfigChange::FocusMinutes(minutes) => {
            timer.focus_seconds = minutes.saturating_mul(60);
            manager.update_timer_config(timer).await
        }
        ConfigChange::ShortBreakMinutes(minutes) => {
            timer.short_break_seconds = minutes.saturating_mul(60);
            manager.update_timer_config(timer).await
        }
        ConfigChange::LongBreakMinutes(minutes) => {
            timer.long_break_seconds = minutes.saturating_mul(60);
            manager.update_timer_config(timer).await
        }
        ConfigChange::SessionsBeforeLongBreak(sessions) => {
            timer.sessions_before_long_break = sessions;
            manager.update_timer_config(timer).await
        }
        ConfigChange::TickIntervalMs(ms) => manager.update_daemon_config(None, Some(ms), None).await,
        ConfigChange::Autosave(enabled) => {
            manager.update_daemon_config(None, None, Some(enabled)).await
        }
        ConfigChange::LogLevel(level) => manager.update_daemon_config(Some(level), None, None).await,
    };

    match result {
        Ok(config) => format!(
            "Saved, applies from the next start. {}",
            describe_config(&config)
        ),
        Err(e) => {
            tracing::warn!("Config change rejected: {}", e);
            format!("Config not changed: {}", e)
        }
    }
}

fn describe_config(config: &Config) -> String {
    format!(
        "Focus {}m | Short break {}m | Long break {}m every {} | Tick {}ms | Autosave {} | Log {}",
        config.timer.focus_minutes(),
        config.timer.short_break_minutes(),
        config.timer.long_break_minutes(),
        config.timer.sessions_before_long_break,
        config.daemon.tick_interval_ms,
        if config.daemon.autosave { "on" } else { "off" },
        config.daemon.log_level
    )
}
