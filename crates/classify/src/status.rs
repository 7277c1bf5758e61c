use serde::{Deserialize, Serialize};

use crate::rules::ContentKind;

/// What a source is playing, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackStatus {
    Ad {
        app: String,
    },
    Content {
        kind: ContentKind,
        app: String,
        title: String,
        body: String,
    },
    Unknown {
        app: String,
    },
}

impl PlaybackStatus {
    pub fn is_ad(&self) -> bool {
        matches!(self, PlaybackStatus::Ad { .. })
    }

    pub fn app(&self) -> &str {
        match self {
            PlaybackStatus::Ad { app }
            | PlaybackStatus::Content { app, .. }
            | PlaybackStatus::Unknown { app } => app,
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Ad { app } => write!(f, "Playing: Ad ({app})"),
            PlaybackStatus::Content {
                kind,
                app,
                title,
                body,
            } => write!(f, "Playing: {kind} ({app})\n{title}\n{body}"),
            PlaybackStatus::Unknown { app } => write!(f, "Playing: Unknown ({app})"),
        }
    }
}
