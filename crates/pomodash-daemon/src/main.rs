//! Pomodash Daemon
//!
//! Runs a pomodoro timer session driven by stdin commands.

use anyhow::Result;
use clap::Parser;
use pomodash_core::storage::{init_data_dir, SnapshotStorage};
use pomodash_daemon::command::{Command, Reply};
use pomodash_daemon::{observer, ConfigManager, TickSource, TimerManager};
use std::fs;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "pomodashd")]
#[command(about = "Pomodash daemon - pomodoro interval timer", long_about = None)]
struct Args {
    /// Log level (overrides the configured one)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Directory holding config.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Directory holding the timer snapshot and log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Start fresh instead of resuming the saved timer
    #[arg(long)]
    no_restore: bool,

    /// Start counting down immediately
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = match &args.config_dir {
        Some(dir) => ConfigManager::with_dir(dir.clone())?,
        None => ConfigManager::new()?,
    };
    let config = config_manager.get().await;

    let data_dir = match &args.data_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => init_data_dir()?,
    };
    let log_file_path = data_dir.join("daemon.log");

    // Create log file with append mode
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Initialize logging - write to both file and stdout
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stdout_writer = std::io::stdout.with_max_level(tracing::Level::INFO);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    let log_level = args.log_level.as_deref().unwrap_or(config.daemon.log_level.as_str());
    tracing_subscriber::fmt()
        .with_writer(stdout_writer.and(file_writer))
        .with_env_filter(log_level)
        .with_ansi(false) // No color codes in log file
        .init();

    tracing::info!("Pomodash daemon starting...");
    tracing::info!("Data dir: {}", data_dir.display());
    tracing::info!("Log file: {}", log_file_path.display());

    let tick_source = TickSource::from_millis(config.daemon.tick_interval_ms);
    let storage = SnapshotStorage::new(data_dir);
    let manager = if args.no_restore {
        storage.clear()?;
        TimerManager::new(config.timer, tick_source).with_storage(storage)
    } else {
        TimerManager::restore(config.timer, tick_source, storage)
    };
    let manager = manager.with_autosave(config.daemon.autosave);

    let observer_handle = observer::spawn_log_observer(manager.subscribe());
    manager.run().await?;

    let engine = manager.engine();
    if args.autostart {
        engine.start().await;
    }

    tracing::info!("Daemon ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => line?,
        };

        // EOF
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => match command.execute(&engine, &config_manager).await {
                Reply::Message(message) => println!("{}", message),
                Reply::Quit => break,
            },
            Err(e) => {
                tracing::warn!("Rejected command '{}': {}", line.trim(), e);
                eprintln!("{}", e);
            }
        }
    }

    tracing::info!("Shutting down...");
    let final_state = manager.shutdown().await?;
    tracing::info!(
        "Final state: {} with {}s left",
        final_state.mode,
        final_state.remaining_seconds
    );

    drop(engine);
    drop(manager);
    let _ = observer_handle.await;

    Ok(())
}
