//! Daemon settings from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use volume0_arbiter::{MemoryActuator, VolumeActuator};

use crate::pactl::PactlActuator;

pub const DB_ENV: &str = "VOLUME0_DB";
pub const ACTUATOR_ENV: &str = "VOLUME0_ACTUATOR";

/// Which device the arbiter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorKind {
    /// PulseAudio/PipeWire default sink via `pactl`.
    #[default]
    Pactl,
    /// In-process level, for dry runs.
    Memory,
}

impl FromStr for ActuatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pactl" => Ok(Self::Pactl),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown actuator {other:?}, expected \"pactl\" or \"memory\""),
        }
    }
}

impl ActuatorKind {
    pub fn build(self) -> Arc<dyn VolumeActuator> {
        match self {
            Self::Pactl => Arc::new(PactlActuator::new()),
            Self::Memory => Arc::new(MemoryActuator::new(50, 100)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub db_path: PathBuf,
    pub actuator: ActuatorKind,
}

impl DaemonSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(
            std::env::var(DB_ENV).ok(),
            std::env::var(ACTUATOR_ENV).ok(),
        )
    }

    pub fn from_vars(db: Option<String>, actuator: Option<String>) -> anyhow::Result<Self> {
        let db_path = match db.filter(|s| !s.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let actuator = match actuator {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid {ACTUATOR_ENV}"))?,
            None => ActuatorKind::default(),
        };
        Ok(Self { db_path, actuator })
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir().context("no local data directory; set VOLUME0_DB")?;
    Ok(base.join("volume0").join("config.db"))
}
