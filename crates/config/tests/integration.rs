//! Integration tests for the config crate.
//!
//! Uses in-memory SQLite for most tests, tempdirs where persistence matters.

use volume0_config::{
    ConfigError, ConfigStore, SqliteConfigStore, SourceConfig, SUPPORTED_SOURCES,
};

const SPOTIFY: &str = "com.spotify.music";
const SOUNDCLOUD: &str = "com.soundcloud.android";

fn create_test_store() -> SqliteConfigStore {
    SqliteConfigStore::open_in_memory().expect("Failed to create in-memory store")
}

fn find<'a>(configs: &'a [SourceConfig], id: &str) -> &'a SourceConfig {
    configs
        .iter()
        .find(|c| c.source_id == id)
        .expect("source should be in catalog")
}

// =============================================================================
// Store Initialization Tests
// =============================================================================

mod initialization {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        assert!(SqliteConfigStore::open_in_memory().is_ok());
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.db");

        let store = SqliteConfigStore::open(&path);
        assert!(store.is_ok(), "Should create file-based store");
        assert!(path.exists(), "Database file should exist");
    }

    #[test]
    fn test_settings_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.db");

        {
            let store = SqliteConfigStore::open(&path).unwrap();
            store.set_attenuation(SPOTIFY, 25).unwrap();
            store.set_enabled(SOUNDCLOUD, false).unwrap();
        }

        {
            let store = SqliteConfigStore::open(&path).unwrap();
            let configs = store.load_all().unwrap();
            assert_eq!(find(&configs, SPOTIFY).attenuation_percent, 25);
            assert!(!find(&configs, SOUNDCLOUD).enabled);
        }
    }

    #[test]
    fn test_invalid_path_fails() {
        let result = SqliteConfigStore::open(&PathBuf::from("/nonexistent/path/config.db"));
        assert!(result.is_err(), "Should fail with invalid path");
    }
}

// =============================================================================
// Settings Tests
// =============================================================================

mod settings {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let store = create_test_store();
        let configs = store.load_all().unwrap();

        assert_eq!(configs.len(), SUPPORTED_SOURCES.len());
        for (config, source) in configs.iter().zip(SUPPORTED_SOURCES) {
            assert_eq!(config.source_id, source.source_id);
            assert_eq!(config.name, source.name);
            assert_eq!(config.enabled, source.default_enabled);
            assert_eq!(config.attenuation_percent, source.default_attenuation);
        }
    }

    #[test]
    fn test_set_attenuation_overwrites() {
        let store = create_test_store();
        store.set_attenuation(SPOTIFY, 10).unwrap();
        store.set_attenuation(SPOTIFY, 35).unwrap();

        let configs = store.load_all().unwrap();
        assert_eq!(find(&configs, SPOTIFY).attenuation_percent, 35);
    }

    #[test]
    fn test_set_attenuation_rejects_over_100() {
        let store = create_test_store();
        let result = store.set_attenuation(SPOTIFY, 101);
        assert!(matches!(result, Err(ConfigError::InvalidPercent(101))));

        let configs = store.load_all().unwrap();
        assert_eq!(find(&configs, SPOTIFY).attenuation_percent, 0);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let store = create_test_store();
        assert!(matches!(
            store.set_enabled("com.example.player", true),
            Err(ConfigError::UnknownSource(_))
        ));
        assert!(matches!(
            store.set_attenuation("com.example.player", 10),
            Err(ConfigError::UnknownSource(_))
        ));
    }
}

// =============================================================================
// Snapshot Tests
// =============================================================================

mod snapshot {
    use super::*;

    #[test]
    fn test_enabled_sources_reflects_toggles() {
        let store = create_test_store();
        store.set_attenuation(SPOTIFY, 20).unwrap();
        store.set_enabled(SOUNDCLOUD, false).unwrap();

        let snapshot = store.enabled_sources().unwrap();
        assert_eq!(snapshot.percent(SPOTIFY), Some(20));
        assert_eq!(snapshot.percent(SOUNDCLOUD), None);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let store = create_test_store();
        let before = store.enabled_sources().unwrap();

        store.set_enabled(SPOTIFY, false).unwrap();

        assert!(before.contains(SPOTIFY), "Old snapshot must not change");
        assert!(!store.enabled_sources().unwrap().contains(SPOTIFY));
    }
}
