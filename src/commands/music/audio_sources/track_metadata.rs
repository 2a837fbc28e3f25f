//! Defines the `Track` struct, the crate's own view of a playable track as
//! resolved by the audio node, and the conversion from Lavalink's track model.

use lavalink_rs::model::track::TrackData;
use std::time::Duration;

/// Unified representation of a track resolved by the audio node.
///
/// Immutable once fetched: the session only ever moves tracks between the
/// queue, the now-playing slot and the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// The title of the track.
    pub title: String,
    /// The artist/uploader as reported by the source.
    pub author: String,
    /// Length of the track. Streams report a practically unbounded length.
    pub length: Duration,
    /// Where the track came from, if the source exposes a link.
    pub uri: Option<String>,
    /// Album name, only provided by sources that know about albums.
    pub album: Option<String>,
    /// Cover/thumbnail image.
    pub artwork_url: Option<String>,
    /// Name of the source plugin on the node (`soundcloud`, `youtube`, ...).
    pub source_name: String,
    /// Opaque node-side identifier of this track.
    pub encoded: String,
}

impl Track {
    /// Two tracks are the same playback item when the node encodes them identically.
    pub fn is_same(&self, other: &Track) -> bool {
        self.encoded == other.encoded
    }

    /// Markdown link for embeds, falling back to a plain title.
    pub fn markdown_link(&self) -> String {
        match &self.uri {
            Some(uri) => format!("[{}]({})", self.title, uri),
            None => self.title.clone(),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// Converts a track loaded by Lavalink into a `Track`.
impl From<&TrackData> for Track {
    fn from(data: &TrackData) -> Self {
        // LavaSrc-style plugins report the album in the plugin payload.
        let album = serde_json::to_value(data).ok().and_then(|value| {
            value
                .pointer("/pluginInfo/albumName")
                .and_then(|album| album.as_str())
                .map(str::to_string)
        });

        Track {
            title: data.info.title.clone(),
            author: data.info.author.clone(),
            length: Duration::from_millis(data.info.length),
            uri: data.info.uri.clone(),
            album,
            artwork_url: data.info.artwork_url.clone(),
            source_name: data.info.source_name.clone(),
            encoded: data.encoded.clone(),
        }
    }
}
