//! Node event plumbing: the router task fanning node events out per guild,
//! and the per-guild dispatcher that feeds them to the session and runs the
//! inactivity timer.

use serenity::all::{ChannelId, CreateMessage, GuildId};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use super::embedded_messages;
use super::music_manager::MusicManager;
use super::session::Session;
use super::sound_board;
use crate::commands::music::audio_sources::Track;

/// Event reported by the audio node, already converted to crate types.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    Ready {
        resumed: bool,
        session_id: String,
    },
    TrackStarted {
        guild_id: GuildId,
        track: Track,
    },
    TrackEnded {
        guild_id: GuildId,
        track: Track,
        /// False when the track was stopped or replaced rather than finished.
        may_start_next: bool,
    },
}

/// The part of a [`NodeEvent`] a single guild's session cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum GuildEvent {
    TrackStarted(Track),
    TrackEnded { track: Track, may_start_next: bool },
}

/// Forwards node events to the dispatcher of the guild they belong to.
///
/// Runs until every sender of the node channel is dropped.
pub async fn route_node_events(
    manager: Arc<MusicManager>,
    mut events: mpsc::UnboundedReceiver<NodeEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            NodeEvent::Ready {
                resumed,
                session_id,
            } => {
                info!(
                    "Audio node ready (session {}, resumed: {})",
                    session_id, resumed
                );
            }
            NodeEvent::TrackStarted { guild_id, track } => {
                manager.dispatch(guild_id, GuildEvent::TrackStarted(track));
            }
            NodeEvent::TrackEnded {
                guild_id,
                track,
                may_start_next,
            } => {
                manager.dispatch(
                    guild_id,
                    GuildEvent::TrackEnded {
                        track,
                        may_start_next,
                    },
                );
            }
        }
    }

    warn!("Audio node event stream closed");
}

/// Per-guild dispatcher, spawned with the session and aborted on teardown.
///
/// Applies the guild's node events in order and plays an idle filler once the
/// session has been idle for the configured timeout. A zero timeout disables
/// the filler.
pub(crate) async fn guild_event_loop(
    manager: Arc<MusicManager>,
    guild_id: GuildId,
    session: Arc<Mutex<Session>>,
    mut events: mpsc::UnboundedReceiver<GuildEvent>,
) {
    let idle_timeout = manager.config().idle_timeout;
    let mut idle_since = Some(Instant::now());

    loop {
        let deadline = idle_since
            .filter(|_| !idle_timeout.is_zero())
            .map(|since| since + idle_timeout);

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                handle_guild_event(&manager, &session, event).await;
            }
            _ = wait_for(deadline) => {
                play_idle_filler(&manager, guild_id, &session).await;
                // Restart the countdown whether or not the filler started
                idle_since = None;
            }
        }

        let idle = session.lock().await.is_idle();
        idle_since = match (idle, idle_since) {
            (true, Some(since)) => Some(since),
            (true, None) => Some(Instant::now()),
            (false, _) => None,
        };
    }

    debug!("Event loop for guild {} finished", guild_id);
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn handle_guild_event(manager: &MusicManager, session: &Mutex<Session>, event: GuildEvent) {
    match event {
        GuildEvent::TrackStarted(track) => {
            let (started, home) = {
                let mut session = session.lock().await;
                (session.on_track_started(track), session.home_channel())
            };

            if let (Some(track), Some(channel)) = (started, home) {
                announce_now_playing(manager, channel, &track).await;
            }
        }
        GuildEvent::TrackEnded {
            track,
            may_start_next,
        } => {
            let mut session = session.lock().await;
            if let Err(e) = session.on_track_ended(track, may_start_next).await {
                error!(
                    "Failed to advance playback in guild {}: {}",
                    session.guild_id(),
                    e
                );
            }
        }
    }
}

async fn play_idle_filler(manager: &MusicManager, guild_id: GuildId, session: &Mutex<Session>) {
    if !session.lock().await.is_idle() {
        return;
    }

    let filler = match manager.load_sound(guild_id, sound_board::IDLE).await {
        Ok(filler) => filler,
        Err(e) => {
            debug!("No idle sound for guild {}: {}", guild_id, e);
            return;
        }
    };

    match session.lock().await.on_inactivity_elapsed(filler).await {
        Ok(true) => info!("Guild {} went idle, playing filler sound", guild_id),
        Ok(false) => debug!("Guild {} became busy before the filler started", guild_id),
        Err(e) => warn!("Failed to play idle sound in guild {}: {}", guild_id, e),
    }
}

async fn announce_now_playing(manager: &MusicManager, channel: ChannelId, track: &Track) {
    let Some(http) = manager.http() else {
        return;
    };

    let message = CreateMessage::new().embed(embedded_messages::now_playing(track));
    if let Err(e) = channel.send_message(http, message).await {
        warn!("Failed to announce now playing in {}: {}", channel, e);
    }
}
