//! Notification classification for volume0.
//!
//! Turns a media notification (title, body, subtitle) into:
//! - an ad / not-ad verdict the arbiter acts on
//! - a status line for display
//!
//! # Example
//!
//! ```
//! use volume0_classify::{classify, Notification};
//!
//! let n = Notification::new("com.spotify.music", "Advertisement", "");
//! let c = classify(&n);
//! assert!(c.is_ad);
//! assert_eq!(c.status.to_string(), "Playing: Ad (Spotify)");
//! ```

mod rules;
mod status;

pub use rules::{content_kind, is_ad, mentions_ad, ContentKind, AD_KEYWORDS, SONG_SOURCES};
pub use status::PlaybackStatus;

use serde::{Deserialize, Serialize};
use volume0_events::{ClassificationEvent, NowPlayingEvent};

/// A media notification as posted by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl Notification {
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Result of classifying one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub source_id: String,
    pub is_ad: bool,
    pub status: PlaybackStatus,
    pub timestamp_ms: u64,
}

impl Classification {
    /// Event for the arbiter.
    pub fn to_event(&self) -> ClassificationEvent {
        ClassificationEvent::new(self.source_id.clone(), self.is_ad, self.timestamp_ms)
    }

    /// Status line for the presentation layer.
    pub fn to_now_playing(&self) -> NowPlayingEvent {
        NowPlayingEvent {
            source_id: self.source_id.clone(),
            status: self.status.to_string(),
        }
    }
}

/// Classify a notification.
///
/// Ads win over everything; content needs both a title and a body;
/// anything else is unknown.
pub fn classify(notification: &Notification) -> Classification {
    let app = volume0_config::display_name(&notification.source_id).to_string();
    let Notification {
        source_id,
        title,
        body,
        subtitle,
        timestamp_ms,
    } = notification;

    let status = if is_ad(title, body, subtitle) {
        PlaybackStatus::Ad { app }
    } else if !title.is_empty() && !body.is_empty() {
        PlaybackStatus::Content {
            kind: content_kind(source_id),
            app,
            title: title.clone(),
            body: body.clone(),
        }
    } else {
        PlaybackStatus::Unknown { app }
    };

    tracing::debug!(source_id = %source_id, status = ?status, "classified notification");

    Classification {
        source_id: source_id.clone(),
        is_ad: status.is_ad(),
        status,
        timestamp_ms: *timestamp_ms,
    }
}
