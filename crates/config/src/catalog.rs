//! Sources volume0 knows how to act on.
//!
//! Pure data - no I/O.

/// A source the user can enable, with its factory defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedSource {
    /// Display name (e.g., "Spotify")
    pub name: &'static str,
    /// Upstream identifier (e.g., "com.spotify.music")
    pub source_id: &'static str,
    /// Enabled until the user says otherwise.
    pub default_enabled: bool,
    /// Ad volume as a percentage of max, until the user says otherwise.
    pub default_attenuation: u8,
}

/// Name shown for sources missing from [`SUPPORTED_SOURCES`].
pub const UNKNOWN_APP_NAME: &str = "Unknown App";

pub const SUPPORTED_SOURCES: &[SupportedSource] = &[
    SupportedSource {
        name: "SoundCloud",
        source_id: "com.soundcloud.android",
        default_enabled: true,
        default_attenuation: 0,
    },
    SupportedSource {
        name: "Spotify",
        source_id: "com.spotify.music",
        default_enabled: true,
        default_attenuation: 0,
    },
];

pub fn find_source(source_id: &str) -> Option<&'static SupportedSource> {
    SUPPORTED_SOURCES.iter().find(|s| s.source_id == source_id)
}

/// Display name for a source, falling back to [`UNKNOWN_APP_NAME`].
pub fn display_name(source_id: &str) -> &'static str {
    find_source(source_id).map_or(UNKNOWN_APP_NAME, |s| s.name)
}
