//! Ad detection and content-kind tables.
//!
//! Pure domain logic - no I/O, no platform dependencies.

use serde::{Deserialize, Serialize};

/// Keywords that mark a notification field as an ad (case-insensitive).
pub const AD_KEYWORDS: &[&str] = &["advertisement", "sponsored"];

/// Sources whose content is audio; everything else is treated as video.
pub const SONG_SOURCES: &[&str] = &[
    "com.soundcloud.android",
    "com.spotify.music",
    "com.pandora.android",
];

/// Kind of non-ad content a source plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Song,
    Video,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Song => "Song",
            ContentKind::Video => "Video",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn content_kind(source_id: &str) -> ContentKind {
    if SONG_SOURCES.iter().any(|&s| s == source_id) {
        ContentKind::Song
    } else {
        ContentKind::Video
    }
}

/// Whether a single field mentions one of [`AD_KEYWORDS`].
pub fn mentions_ad(text: &str) -> bool {
    let lower = text.to_lowercase();
    AD_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Ad rule over the notification fields.
///
/// An empty body also counts: ad creatives usually ship without description
/// text.
pub fn is_ad(title: &str, body: &str, subtitle: &str) -> bool {
    mentions_ad(title) || mentions_ad(body) || mentions_ad(subtitle) || body.is_empty()
}
