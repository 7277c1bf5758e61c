use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::SupportedSource;
use crate::Result;

/// Effective settings for one supported source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub source_id: String,
    pub enabled: bool,
    /// Ad volume as a percentage of the actuator's max, `0..=100`.
    pub attenuation_percent: u8,
}

impl SourceConfig {
    pub(crate) fn from_defaults(source: &SupportedSource) -> Self {
        Self {
            name: source.name.to_string(),
            source_id: source.source_id.to_string(),
            enabled: source.default_enabled,
            attenuation_percent: source.default_attenuation,
        }
    }
}

/// Immutable snapshot of enabled sources and their attenuation.
///
/// The arbiter swaps in a whole new snapshot on every configuration change;
/// it is never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledSources {
    percents: HashMap<String, u8>,
}

impl EnabledSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from effective configs, keeping only enabled ones.
    pub fn from_configs<'a>(configs: impl IntoIterator<Item = &'a SourceConfig>) -> Self {
        configs
            .into_iter()
            .filter(|c| c.enabled)
            .map(|c| (c.source_id.clone(), c.attenuation_percent))
            .collect()
    }

    /// Attenuation percent for an enabled source.
    pub fn percent(&self, source_id: &str) -> Option<u8> {
        self.percents.get(source_id).copied()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.percents.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.percents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.percents.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for EnabledSources {
    fn from_iter<I: IntoIterator<Item = (S, u8)>>(iter: I) -> Self {
        Self {
            percents: iter
                .into_iter()
                .map(|(id, percent)| (id.into(), percent.min(100)))
                .collect(),
        }
    }
}

/// Read/write contract for per-source settings.
pub trait ConfigStore: Send + Sync {
    /// Effective settings for every supported source, in catalog order.
    fn load_all(&self) -> Result<Vec<SourceConfig>>;

    fn set_enabled(&self, source_id: &str, enabled: bool) -> Result<()>;

    /// Fails with `InvalidPercent` above 100 and `UnknownSource` for ids
    /// outside the catalog.
    fn set_attenuation(&self, source_id: &str, percent: u32) -> Result<()>;

    /// Snapshot of enabled sources for the arbiter.
    fn enabled_sources(&self) -> Result<EnabledSources> {
        let configs = self.load_all()?;
        let snapshot = EnabledSources::from_configs(&configs);
        tracing::debug!(enabled = snapshot.len(), "built enabled-source snapshot");
        Ok(snapshot)
    }
}
