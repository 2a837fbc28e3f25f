//! `AudioNode` backed by a Lavalink server through `lavalink-rs`.
//!
//! Songbird only negotiates the voice gateway here; the resulting connection
//! info is handed to Lavalink, which streams the audio itself.

use lavalink_rs::client::LavalinkClient;
use lavalink_rs::hook;
use lavalink_rs::model::events::{self, Events, TrackEndReason};
use lavalink_rs::model::player::{ConnectionInfo, Filters, Karaoke, Timescale};
use lavalink_rs::model::track::{TrackData, TrackLoadData};
use lavalink_rs::node::NodeBuilder;
use lavalink_rs::prelude::NodeDistributionStrategy;
use serenity::all::{ChannelId, GuildId, UserId};
use serenity::async_trait;
use songbird::Songbird;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{AudioNode, PlayerHandle, SearchResult, SearchSource, Track};
use crate::commands::music::utils::event_handlers::NodeEvent;
use crate::commands::music::utils::filters::FilterPreset;
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::config::LavalinkConfig;

/// User data attached to the Lavalink client so hooks can reach the event channel.
struct EventSender(UnboundedSender<NodeEvent>);

pub struct LavalinkNode {
    client: LavalinkClient,
    songbird: Arc<Songbird>,
    search_timeout: Duration,
}

impl LavalinkNode {
    /// Connects to the node and forwards its events into `events`.
    pub async fn connect(
        config: &LavalinkConfig,
        bot_id: UserId,
        songbird: Arc<Songbird>,
        search_timeout: Duration,
        events: UnboundedSender<NodeEvent>,
    ) -> Self {
        let hooks = Events {
            ready: Some(ready),
            track_start: Some(track_start),
            track_end: Some(track_end),
            ..Default::default()
        };

        let node = NodeBuilder {
            hostname: format!("{}:{}", config.host, config.port),
            is_ssl: config.ssl,
            events: Events::default(),
            password: config.password.clone(),
            user_id: bot_id.get().into(),
            session_id: None,
        };

        info!("Connecting to Lavalink at {}:{}", config.host, config.port);
        let client = LavalinkClient::new_with_data(
            hooks,
            vec![node],
            NodeDistributionStrategy::round_robin(),
            Arc::new(EventSender(events)),
        )
        .await;

        Self {
            client,
            songbird,
            search_timeout,
        }
    }

    fn player(&self, player: &PlayerHandle) -> MusicResult<lavalink_rs::player_context::PlayerContext> {
        self.client
            .get_player_context(player.guild_id.get())
            .ok_or(MusicError::NoActiveSession)
    }
}

/// Payload `play_now` needs: the node replays a track from its encoded form alone.
fn replay_data(track: &Track) -> TrackData {
    TrackData {
        encoded: track.encoded.clone(),
        ..Default::default()
    }
}

fn node_error(err: impl std::fmt::Display) -> MusicError {
    MusicError::NodeError(err.to_string())
}

#[async_trait]
impl AudioNode for LavalinkNode {
    async fn search(
        &self,
        guild_id: GuildId,
        query: &str,
        source: SearchSource,
    ) -> MusicResult<SearchResult> {
        let identifier = source.identifier(query);
        let loaded = timeout(
            self.search_timeout,
            self.client.load_tracks(guild_id.get(), &identifier),
        )
        .await?
        .map_err(node_error)?;

        let result = match loaded.data {
            Some(TrackLoadData::Track(data)) => SearchResult::Track(Track::from(&data)),
            Some(TrackLoadData::Search(results)) if !results.is_empty() => {
                SearchResult::Search(results.iter().map(Track::from).collect())
            }
            Some(TrackLoadData::Playlist(playlist)) => SearchResult::Playlist {
                name: playlist.info.name.clone(),
                tracks: playlist.tracks.iter().map(Track::from).collect(),
            },
            Some(TrackLoadData::Error(e)) => {
                warn!("Lavalink failed to load '{}': {:?}", identifier, e);
                return Err(MusicError::NodeError(e.message));
            }
            _ => SearchResult::Empty,
        };

        debug!("Loaded '{}' for guild {}", identifier, guild_id);
        Ok(result)
    }

    async fn connect(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
    ) -> MusicResult<PlayerHandle> {
        let (info, _call) = self
            .songbird
            .join_gateway(guild_id, voice_channel)
            .await
            .map_err(|e| MusicError::JoinFailed(e.to_string()))?;

        let connection = ConnectionInfo {
            endpoint: info.endpoint,
            token: info.token,
            session_id: info.session_id,
        };

        self.client
            .create_player_context(guild_id.get(), connection)
            .await
            .map_err(|e| MusicError::JoinFailed(e.to_string()))?;

        Ok(PlayerHandle {
            guild_id,
            voice_channel,
        })
    }

    async fn play(&self, player: &PlayerHandle, track: &Track) -> MusicResult<()> {
        self.player(player)?
            .play_now(&replay_data(track))
            .await
            .map_err(node_error)?;
        Ok(())
    }

    async fn stop(&self, player: &PlayerHandle) -> MusicResult<()> {
        self.player(player)?.stop_now().await.map_err(node_error)?;
        Ok(())
    }

    async fn set_paused(&self, player: &PlayerHandle, paused: bool) -> MusicResult<()> {
        self.player(player)?
            .set_pause(paused)
            .await
            .map_err(node_error)?;
        Ok(())
    }

    async fn seek(&self, player: &PlayerHandle, position: Duration) -> MusicResult<()> {
        self.player(player)?
            .set_position(position)
            .await
            .map_err(node_error)?;
        Ok(())
    }

    async fn set_volume(&self, player: &PlayerHandle, volume: u16) -> MusicResult<()> {
        self.player(player)?
            .set_volume(volume)
            .await
            .map_err(node_error)?;
        Ok(())
    }

    async fn set_filters(&self, player: &PlayerHandle, preset: FilterPreset) -> MusicResult<()> {
        let settings = preset.settings();
        let filters = Filters {
            timescale: settings.timescale.map(|t| Timescale {
                pitch: Some(t.pitch),
                speed: Some(t.speed),
                rate: Some(t.rate),
            }),
            karaoke: settings.karaoke.map(|k| Karaoke {
                level: Some(k.level),
                mono_level: Some(k.mono_level),
                filter_band: Some(k.filter_band),
                filter_width: Some(k.filter_width),
            }),
            ..Default::default()
        };

        self.player(player)?
            .set_filters(filters)
            .await
            .map_err(node_error)?;
        Ok(())
    }

    async fn position(&self, player: &PlayerHandle) -> MusicResult<Duration> {
        let state = self
            .player(player)?
            .get_player()
            .await
            .map_err(node_error)?
            .state;
        Ok(Duration::from_millis(state.position))
    }

    async fn disconnect(&self, player: &PlayerHandle) -> MusicResult<()> {
        let guild_id = player.guild_id;
        let deleted = self.client.delete_player(guild_id.get()).await;
        let left = self.songbird.remove(guild_id).await;

        deleted.map_err(node_error)?;
        match left {
            Ok(()) | Err(songbird::error::JoinError::NoCall) => Ok(()),
            Err(e) => Err(node_error(e)),
        }
    }
}

fn send(client: &LavalinkClient, event: NodeEvent) {
    match client.data::<EventSender>() {
        Ok(sender) => {
            if sender.0.send(event).is_err() {
                warn!("Node event receiver dropped");
            }
        }
        Err(e) => error!("Lavalink client has no event sender: {}", e),
    }
}

#[hook]
async fn ready(client: LavalinkClient, session_id: String, event: &events::Ready) {
    send(
        &client,
        NodeEvent::Ready {
            resumed: event.resumed,
            session_id,
        },
    );
}

#[hook]
async fn track_start(client: LavalinkClient, _session_id: String, event: &events::TrackStart) {
    send(
        &client,
        NodeEvent::TrackStarted {
            guild_id: GuildId::new(event.guild_id.0),
            track: Track::from(&event.track),
        },
    );
}

#[hook]
async fn track_end(client: LavalinkClient, _session_id: String, event: &events::TrackEnd) {
    let may_start_next = matches!(
        event.reason,
        TrackEndReason::Finished | TrackEndReason::LoadFailed
    );

    send(
        &client,
        NodeEvent::TrackEnded {
            guild_id: GuildId::new(event.guild_id.0),
            track: Track::from(&event.track),
            may_start_next,
        },
    );
}
