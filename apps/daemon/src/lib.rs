//! volume0 daemon.
//!
//! Reads JSON-line commands on stdin, prints events as JSON lines on stdout,
//! logs to stderr.

mod commands;
mod output;
mod pactl;
mod settings;

pub use commands::{CommandFailed, Daemon, Input, NotificationLine};
pub use output::{render_line, StdoutEventBus};
pub use pactl::{parse_volume, PactlActuator};
pub use settings::{ActuatorKind, DaemonSettings, ACTUATOR_ENV, DB_ENV};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use volume0_config::{ConfigStore, SqliteConfigStore};
use volume0_events::EventBusRef;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,volume0=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = DaemonSettings::from_env()?;
    tracing::info!(
        db = %settings.db_path.display(),
        actuator = ?settings.actuator,
        "Starting volume0 daemon"
    );

    let store: Arc<dyn ConfigStore> = Arc::new(open_store(&settings.db_path)?);
    let bus: EventBusRef = Arc::new(StdoutEventBus::new());
    let mut daemon = Daemon::start(store, settings.actuator.build(), bus)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Err(e) = daemon.handle_line(&line) {
                        tracing::warn!(error = %format!("{e:#}"), "Command failed");
                    }
                }
                Ok(None) => {
                    tracing::info!("Stdin closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    }

    daemon.shutdown().await?;
    tracing::info!("volume0 daemon stopped");
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<SqliteConfigStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteConfigStore::open(path).with_context(|| format!("failed to open {}", path.display()))
}
