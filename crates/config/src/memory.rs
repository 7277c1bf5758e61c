use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::catalog::{find_source, SUPPORTED_SOURCES};
use crate::store::{ConfigStore, SourceConfig};
use crate::{validate_percent, ConfigError, Result};

#[derive(Debug, Default, Clone, Copy)]
struct Overrides {
    enabled: Option<bool>,
    attenuation: Option<u8>,
}

/// Non-persistent store, for tests and dry runs.
#[derive(Default)]
pub struct InMemoryConfigStore {
    overrides: Mutex<HashMap<String, Overrides>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, source_id: &str, f: impl FnOnce(&mut Overrides)) -> Result<()> {
        if find_source(source_id).is_none() {
            return Err(ConfigError::UnknownSource(source_id.to_string()));
        }
        let mut overrides = self.overrides.lock().unwrap_or_else(PoisonError::into_inner);
        f(overrides.entry(source_id.to_string()).or_default());
        Ok(())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_all(&self) -> Result<Vec<SourceConfig>> {
        let overrides = self.overrides.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(SUPPORTED_SOURCES
            .iter()
            .map(|source| {
                let mut config = SourceConfig::from_defaults(source);
                if let Some(o) = overrides.get(source.source_id) {
                    config.enabled = o.enabled.unwrap_or(config.enabled);
                    config.attenuation_percent =
                        o.attenuation.unwrap_or(config.attenuation_percent);
                }
                config
            })
            .collect())
    }

    fn set_enabled(&self, source_id: &str, enabled: bool) -> Result<()> {
        self.update(source_id, |o| o.enabled = Some(enabled))
    }

    fn set_attenuation(&self, source_id: &str, percent: u32) -> Result<()> {
        let percent = validate_percent(percent)?;
        self.update(source_id, |o| o.attenuation = Some(percent))
    }
}
