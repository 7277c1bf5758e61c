//! Per-source configuration for volume0.
//!
//! Tracks which sources the arbiter acts on and how far their ads are
//! attenuated. The arbiter never reads the store directly: it receives an
//! [`EnabledSources`] snapshot whenever the configuration changes.

mod catalog;
mod memory;
mod sqlite;
mod store;

pub use catalog::{display_name, find_source, SupportedSource, SUPPORTED_SOURCES, UNKNOWN_APP_NAME};
pub use memory::InMemoryConfigStore;
pub use sqlite::SqliteConfigStore;
pub use store::{ConfigStore, EnabledSources, SourceConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error("attenuation must be within 0..=100, got {0}")]
    InvalidPercent(u32),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Validate an attenuation percentage coming from outside.
pub fn validate_percent(percent: u32) -> Result<u8> {
    if percent > 100 {
        return Err(ConfigError::InvalidPercent(percent));
    }
    Ok(percent as u8)
}
