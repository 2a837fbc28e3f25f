//! This module defines the seam between the playback session and the external
//! audio node. The session never talks to Lavalink directly: every side effect
//! goes through the `AudioNode` trait, implemented for production by
//! [`lavalink::LavalinkNode`].

/// Submodule implementing `AudioNode` on top of `lavalink-rs`.
pub mod lavalink;
/// Submodule defining the `Track` struct used across the music module.
pub mod track_metadata;

use crate::commands::music::utils::filters::FilterPreset;
use crate::commands::music::utils::music_manager::MusicResult;
use serenity::all::{ChannelId, GuildId};
use serenity::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub use track_metadata::Track;

/// Handle to the node-side player bound to one guild's voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerHandle {
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
}

/// What a search on the node produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// A direct link resolved to exactly one track.
    Track(Track),
    /// A search query; results ordered by relevance.
    Search(Vec<Track>),
    /// A playlist link, tracks in playlist order.
    Playlist { name: String, tracks: Vec<Track> },
    Empty,
}

impl SearchResult {
    /// The single track a plain `play` would pick from this result.
    pub fn into_first(self) -> Option<Track> {
        match self {
            SearchResult::Track(track) => Some(track),
            SearchResult::Search(tracks) | SearchResult::Playlist { tracks, .. } => {
                tracks.into_iter().next()
            }
            SearchResult::Empty => None,
        }
    }
}

/// Search scope on the audio node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    /// The query is a link and is handed to the node as-is.
    Direct,
    YouTube,
    YouTubeMusic,
    SoundCloud,
    Spotify,
}

impl SearchSource {
    /// Picks the search scope for a query.
    ///
    /// Links go to the node untouched, queries naming a platform are searched
    /// on that platform, everything else goes to `fallback`.
    pub fn sniff(query: &str, fallback: SearchSource) -> SearchSource {
        if is_link(query) {
            return SearchSource::Direct;
        }

        let query = query.to_lowercase();
        if query.contains("music.youtube") {
            SearchSource::YouTubeMusic
        } else if query.contains("youtube") || query.contains("youtu.be") {
            SearchSource::YouTube
        } else if query.contains("soundcloud") {
            SearchSource::SoundCloud
        } else if query.contains("spotify") {
            SearchSource::Spotify
        } else {
            fallback
        }
    }

    /// Lavalink identifier for `query` in this scope.
    pub fn identifier(&self, query: &str) -> String {
        match self {
            SearchSource::Direct => query.to_string(),
            SearchSource::YouTube => format!("ytsearch:{}", query),
            SearchSource::YouTubeMusic => format!("ytmsearch:{}", query),
            SearchSource::SoundCloud => format!("scsearch:{}", query),
            SearchSource::Spotify => format!("spsearch:{}", query),
        }
    }
}

impl FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" | "yt" => Ok(SearchSource::YouTube),
            "youtubemusic" | "youtube_music" | "ytm" => Ok(SearchSource::YouTubeMusic),
            "soundcloud" | "sc" => Ok(SearchSource::SoundCloud),
            "spotify" | "sp" => Ok(SearchSource::Spotify),
            other => Err(format!("unknown search source `{}`", other)),
        }
    }
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchSource::Direct => "direct",
            SearchSource::YouTube => "youtube",
            SearchSource::YouTubeMusic => "youtubemusic",
            SearchSource::SoundCloud => "soundcloud",
            SearchSource::Spotify => "spotify",
        };
        f.write_str(name)
    }
}

/// Only http(s) links count; `Url` alone would accept `artist:title` as a scheme.
fn is_link(query: &str) -> bool {
    Url::parse(query.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Everything the bot needs from the external audio node.
///
/// Implementations must be cheap to share between guild tasks.
#[async_trait]
pub trait AudioNode: Send + Sync {
    /// Resolves `query` in the given scope.
    async fn search(
        &self,
        guild_id: GuildId,
        query: &str,
        source: SearchSource,
    ) -> MusicResult<SearchResult>;

    /// Joins `voice_channel` and creates the node-side player.
    async fn connect(&self, guild_id: GuildId, voice_channel: ChannelId)
    -> MusicResult<PlayerHandle>;

    /// Starts `track` immediately, replacing whatever is playing.
    async fn play(&self, player: &PlayerHandle, track: &Track) -> MusicResult<()>;

    async fn stop(&self, player: &PlayerHandle) -> MusicResult<()>;

    async fn set_paused(&self, player: &PlayerHandle, paused: bool) -> MusicResult<()>;

    async fn seek(&self, player: &PlayerHandle, position: Duration) -> MusicResult<()>;

    async fn set_volume(&self, player: &PlayerHandle, volume: u16) -> MusicResult<()>;

    async fn set_filters(&self, player: &PlayerHandle, preset: FilterPreset) -> MusicResult<()>;

    /// Playback position of the current track.
    async fn position(&self, player: &PlayerHandle) -> MusicResult<Duration>;

    /// Destroys the node-side player and leaves the voice channel.
    async fn disconnect(&self, player: &PlayerHandle) -> MusicResult<()>;
}
