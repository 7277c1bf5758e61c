//! Shared event contracts between the arbiter and whatever displays it.
//!
//! Using shared types prevents runtime deserialization errors from
//! mismatched field names between the daemon and its consumers.
//!
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};

/// A classifier's verdict on what a source is currently playing.
///
/// Producers: classifier (daemon)
/// Consumers: arbiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Upstream identifier, e.g. an application package name.
    pub source_id: String,
    /// Whether the source is currently playing an advertisement.
    pub is_ad: bool,
    /// Arrival time in milliseconds. Only differences matter.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl ClassificationEvent {
    pub fn new(source_id: impl Into<String>, is_ad: bool, timestamp_ms: u64) -> Self {
        Self {
            source_id: source_id.into(),
            is_ad,
            timestamp_ms,
        }
    }
}

/// The shared volume level as the actuator reported it after a write settled
/// (or after the arbiter captured a baseline).
///
/// Producers: arbiter
/// Consumers: presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeObservation {
    /// Level as a percentage of the actuator's maximum, rounded down.
    pub percent_of_max: u8,
}

impl VolumeObservation {
    pub fn new(percent_of_max: u8) -> Self {
        Self { percent_of_max }
    }

    /// Build an observation from an absolute level.
    ///
    /// A zero `max_level` yields 0 rather than dividing by zero.
    pub fn from_level(level: u32, max_level: u32) -> Self {
        if max_level == 0 {
            return Self::new(0);
        }
        let percent = (u64::from(level) * 100) / u64::from(max_level);
        Self::new(percent.min(100) as u8)
    }
}

/// Human-readable "what is playing" line for a source.
///
/// Producers: daemon (after classification)
/// Consumers: presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingEvent {
    /// Source the notification came from.
    pub source_id: String,
    /// Rendered status, e.g. `"Playing: Ad (Spotify)"`.
    pub status: String,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Confirmed (or best-effort) volume level.
    pub const VOLUME_OBSERVED: &str = "volume:observed";
    /// Now-playing status line for a source.
    pub const NOW_PLAYING: &str = "playback:now_playing";
    /// Effective per-source settings, in answer to a listing request.
    pub const SOURCES_LISTED: &str = "config:sources";
    /// A command the daemon could not carry out.
    pub const COMMAND_FAILED: &str = "daemon:error";
}
