use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use crate::catalog::{find_source, SUPPORTED_SOURCES};
use crate::store::{ConfigStore, SourceConfig};
use crate::{validate_percent, ConfigError, Result};

const KEY_ENABLED_PREFIX: &str = "enabled_";
const KEY_VOLUME_PREFIX: &str = "volume_";

/// SQLite-backed settings store.
///
/// Only values the user changed are stored; everything else falls back to
/// the catalog defaults.
pub struct SqliteConfigStore {
    conn: Mutex<Connection>,
}

impl SqliteConfigStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("settings mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("settings mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }
}

fn parse_enabled(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_percent(raw: &str) -> Option<u8> {
    raw.parse::<u32>().ok().and_then(|p| validate_percent(p).ok())
}

impl ConfigStore for SqliteConfigStore {
    fn load_all(&self) -> Result<Vec<SourceConfig>> {
        let conn = self.conn.lock().expect("settings mutex poisoned");
        let mut configs = Vec::with_capacity(SUPPORTED_SOURCES.len());

        for source in SUPPORTED_SOURCES {
            let mut config = SourceConfig::from_defaults(source);

            let enabled_key = format!("{KEY_ENABLED_PREFIX}{}", source.source_id);
            if let Some(raw) = Self::get_setting(&conn, &enabled_key)? {
                match parse_enabled(&raw) {
                    Some(enabled) => config.enabled = enabled,
                    None => tracing::warn!(
                        key = %enabled_key,
                        value = %raw,
                        "ignoring malformed setting"
                    ),
                }
            }

            let volume_key = format!("{KEY_VOLUME_PREFIX}{}", source.source_id);
            if let Some(raw) = Self::get_setting(&conn, &volume_key)? {
                match parse_percent(&raw) {
                    Some(percent) => config.attenuation_percent = percent,
                    None => tracing::warn!(
                        key = %volume_key,
                        value = %raw,
                        "ignoring malformed setting"
                    ),
                }
            }

            configs.push(config);
        }

        Ok(configs)
    }

    fn set_enabled(&self, source_id: &str, enabled: bool) -> Result<()> {
        if find_source(source_id).is_none() {
            return Err(ConfigError::UnknownSource(source_id.to_string()));
        }
        self.put_setting(
            &format!("{KEY_ENABLED_PREFIX}{source_id}"),
            if enabled { "true" } else { "false" },
        )?;
        tracing::info!(source_id, enabled, "source toggled");
        Ok(())
    }

    fn set_attenuation(&self, source_id: &str, percent: u32) -> Result<()> {
        let percent = validate_percent(percent)?;
        if find_source(source_id).is_none() {
            return Err(ConfigError::UnknownSource(source_id.to_string()));
        }
        self.put_setting(&format!("{KEY_VOLUME_PREFIX}{source_id}"), &percent.to_string())?;
        tracing::info!(source_id, percent, "ad attenuation updated");
        Ok(())
    }
}
