//! Static channel catalog.
//!
//! The enumerated set of channels the UI shell renders, plus the baseline
//! range the ambient generator pads each channel with. The presence registry
//! does not consult this table; it tracks any channel id it is handed.

use axum::Json;
use serde::Serialize;

/// Baseline range used for channel ids that are not in the catalog.
pub const DEFAULT_AMBIENT_RANGE: (u32, u32) = (2, 8);

/// One entry in the channel catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Stream video ids, played in sequence
    pub stream_ids: &'static [&'static str],
    /// Inclusive [min, max] ambient baseline
    pub ambient_range: (u32, u32),
}

const CHANNELS: &[Channel] = &[
    Channel {
        id: "lofi",
        name: "lo-fi",
        description: "chill beats to code to",
        icon: "~",
        stream_ids: &["jfKfPfyJRdk", "rUxyKA_-grg"],
        ambient_range: (8, 24),
    },
    Channel {
        id: "synthwave",
        name: "synthwave",
        description: "retro-futuristic focus",
        icon: ">",
        stream_ids: &["4xDzrJKXOOY", "MVPTGNGiI-4"],
        ambient_range: (4, 12),
    },
    Channel {
        id: "ambient",
        name: "ambient",
        description: "deep focus atmospheric",
        icon: "·",
        stream_ids: &["S_MOd40zlYU", "7NOSDKb0HlU"],
        ambient_range: (3, 10),
    },
    Channel {
        id: "jazz",
        name: "jazz-hop",
        description: "smooth jazz & hip-hop fusion",
        icon: "♪",
        stream_ids: &["Dx5qFachd3A", "kgx4WGK0oNU", "fEvM-OUbaKs"],
        ambient_range: (5, 14),
    },
    Channel {
        id: "deepfocus",
        name: "deep-focus",
        description: "minimal techno for flow state",
        icon: "◉",
        stream_ids: &["Kk2jsfBsKX4", "4w7ZtPYJ6J4", "DWcJFNfaw9c"],
        ambient_range: (4, 11),
    },
    Channel {
        id: "classical",
        name: "classical",
        description: "timeless compositions",
        icon: "♫",
        stream_ids: &["jgpJVI3tDbY", "mIYzp5rcTvU"],
        ambient_range: (2, 9),
    },
];

/// All catalog channels in display order.
pub fn all() -> &'static [Channel] {
    CHANNELS
}

pub fn find(id: &str) -> Option<&'static Channel> {
    CHANNELS.iter().find(|c| c.id == id)
}

/// Ambient baseline range for a channel, falling back to
/// [`DEFAULT_AMBIENT_RANGE`] for ids outside the catalog.
pub fn ambient_range(id: &str) -> (u32, u32) {
    find(id)
        .map(|c| c.ambient_range)
        .unwrap_or(DEFAULT_AMBIENT_RANGE)
}

// --- REST endpoint handlers ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub stream_ids: Vec<String>,
}

impl From<&Channel> for ChannelResponse {
    fn from(c: &Channel) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.to_string(),
            description: c.description.to_string(),
            icon: c.icon.to_string(),
            stream_ids: c.stream_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// GET /api/channels - Public catalog listing for the UI shell.
pub async fn list_channels() -> Json<Vec<ChannelResponse>> {
    Json(all().iter().map(ChannelResponse::from).collect())
}
