use dashmap::DashMap;
use serenity::all::{ChannelId, GuildId, Http};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::event_handlers::{self, GuildEvent};
use super::format_duration;
use super::session::Session;
use super::sound_board::{self, SoundBoard};
use crate::commands::music::audio_sources::{AudioNode, SearchSource, Track};
use crate::config::MusicConfig;

/// Errors that can occur during music operations.
///
/// The `Display` text is what users see in the error embed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MusicError {
    #[error("This command can only be used in a server.")]
    NotInGuild,

    #[error("You need to be in a voice channel to use this command.")]
    NotInVoiceChannel,

    #[error("Failed to join your voice channel: {0}")]
    JoinFailed(String),

    #[error("You can only play songs in <#{0}>, as the player has already started there.")]
    WrongChannel(ChannelId),

    #[error("I'm not connected to a voice channel. Use `play` to start a session.")]
    NoActiveSession,

    #[error("Nothing is playing right now.")]
    NothingPlaying,

    #[error("The player is busy, try again when it's idle.")]
    PlayerBusy,

    #[error("No tracks were found for your query.")]
    NoTracksFound,

    #[error("{}", budget(.limit))]
    QueueBudgetExceeded { limit: Duration },

    #[error("Volume must be between 0 and 100, got {0}.")]
    InvalidVolume(i64),

    #[error("Unknown filter `{0}`. Available filters: normal, nightcore, sigma, karaoke, reset.")]
    InvalidFilterMode(String),

    #[error("Invalid time format `{0}`. Use MM:SS or HH:MM:SS.")]
    InvalidSeekFormat(String),

    #[error("Cannot seek to {}, the track is only {} long.", format_duration(*.requested), format_duration(*.length))]
    SeekOutOfRange { requested: Duration, length: Duration },

    #[error("Unknown autoplay mode `{0}`. Use enabled, partial or disabled.")]
    InvalidAutoplayMode(String),

    #[error("Unknown sound `{0}`.")]
    UnknownSound(String),

    #[error("No lyrics found for `{0}`.")]
    LyricsNotFound(String),

    #[error("The lyrics service failed: {0}")]
    LyricsProviderError(String),

    #[error("The search took too long, please try again.")]
    SearchTimedOut,

    #[error("Audio node error: {0}")]
    NodeError(String),
}

fn budget(limit: &Duration) -> String {
    format!(
        "The queue can hold at most {} of music, that would go over the limit.",
        format_duration(*limit)
    )
}

impl From<tokio::time::error::Elapsed> for MusicError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        MusicError::SearchTimedOut
    }
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// A live session plus the task that feeds it node events.
struct GuildSession {
    session: Arc<Mutex<Session>>,
    events: mpsc::UnboundedSender<GuildEvent>,
    dispatcher: AbortHandle,
}

/// Registry of playback sessions, one per guild.
///
/// Sessions are only ever created through [`MusicManager::session_or_join`]
/// and only ever removed through [`MusicManager::teardown`]. Each guild's
/// session sits behind its own lock so guilds never contend with each other.
pub struct MusicManager {
    node: Arc<dyn AudioNode>,
    config: MusicConfig,
    sounds: SoundBoard,
    sessions: DashMap<GuildId, GuildSession>,
    // Serialises concurrent joins for the same guild
    join_locks: DashMap<GuildId, Arc<Mutex<()>>>,
    http: Option<Arc<Http>>,
}

impl MusicManager {
    pub fn new(node: Arc<dyn AudioNode>, config: MusicConfig, sounds: SoundBoard) -> Self {
        Self {
            node,
            config,
            sounds,
            sessions: DashMap::new(),
            join_locks: DashMap::new(),
            http: None,
        }
    }

    /// Enables now-playing announcements in each session's home channel.
    pub fn with_http(mut self, http: Arc<Http>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn config(&self) -> &MusicConfig {
        &self.config
    }

    pub fn sounds(&self) -> &SoundBoard {
        &self.sounds
    }

    pub(crate) fn http(&self) -> Option<Arc<Http>> {
        self.http.clone()
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The guild's live session, or `NoActiveSession`.
    pub fn session(&self, guild_id: GuildId) -> MusicResult<Arc<Mutex<Session>>> {
        self.sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(&entry.session))
            .ok_or(MusicError::NoActiveSession)
    }

    /// The guild's live session, joining `voice_channel` to create one if needed.
    ///
    /// A freshly created session greets the channel with a welcome sound.
    pub async fn session_or_join(
        self: &Arc<Self>,
        guild_id: GuildId,
        voice_channel: Option<ChannelId>,
    ) -> MusicResult<Arc<Mutex<Session>>> {
        if let Ok(session) = self.session(guild_id) {
            return Ok(session);
        }

        let join_lock = Arc::clone(self.join_locks.entry(guild_id).or_default().value());
        let _guard = join_lock.lock().await;

        // Another caller may have finished joining while we waited
        if let Ok(session) = self.session(guild_id) {
            return Ok(session);
        }

        let session = Session::join(Arc::clone(&self.node), guild_id, voice_channel, &self.config).await?;
        let session = Arc::new(Mutex::new(session));

        let (events, rx) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(event_handlers::guild_event_loop(
            Arc::clone(self),
            guild_id,
            Arc::clone(&session),
            rx,
        ))
        .abort_handle();

        self.sessions.insert(
            guild_id,
            GuildSession {
                session: Arc::clone(&session),
                events,
                dispatcher,
            },
        );
        info!("Created playback session for guild {}", guild_id);

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            match manager.greet(guild_id).await {
                Ok(true) => debug!("Played welcome sound in guild {}", guild_id),
                Ok(false) => debug!("Guild {} was already busy, no welcome sound", guild_id),
                Err(e) => debug!("Skipped welcome sound in guild {}: {}", guild_id, e),
            }
        });

        Ok(session)
    }

    /// Hands a node event to the guild's dispatcher. Events for guilds
    /// without a session are dropped.
    pub fn dispatch(&self, guild_id: GuildId, event: GuildEvent) {
        match self.sessions.get(&guild_id) {
            Some(entry) => {
                if entry.events.send(event).is_err() {
                    debug!("Dispatcher for guild {} is gone, dropping event", guild_id);
                }
            }
            None => debug!("No session for guild {}, dropping {:?}", guild_id, event),
        }
    }

    /// Disconnects the guild's session and forgets it.
    ///
    /// The session is removed from the registry before it is disconnected, so
    /// nothing can reach it afterwards.
    pub async fn teardown(&self, guild_id: GuildId) -> MusicResult<()> {
        let (_, entry) = self
            .sessions
            .remove(&guild_id)
            .ok_or(MusicError::NoActiveSession)?;
        entry.dispatcher.abort();
        self.join_locks.remove(&guild_id);

        let mut session = entry.session.lock().await;
        match session.disconnect().await {
            Ok(()) => Ok(()),
            // Already torn down by the holder of the lock before us
            Err(MusicError::NoActiveSession) => Ok(()),
            Err(e) => {
                warn!("Error while leaving voice in guild {}: {}", guild_id, e);
                Err(e)
            }
        }
    }

    /// Resolves a random entry of `category` on the node.
    pub async fn load_sound(&self, guild_id: GuildId, category: &str) -> MusicResult<Track> {
        let identifier = self.sounds.pick(category)?;
        self.node
            .search(guild_id, identifier, SearchSource::Direct)
            .await?
            .into_first()
            .ok_or(MusicError::NoTracksFound)
    }

    /// Welcome sound for a fresh session. Yields to anything the caller
    /// started in the meantime, including a requested sound.
    async fn greet(&self, guild_id: GuildId) -> MusicResult<bool> {
        let session = self.session(guild_id)?;
        let sound = self.load_sound(guild_id, sound_board::WELCOME).await?;

        session.lock().await.play_filler_when_idle(sound).await
    }

    /// Plays a filler sound from `category` in the guild's session.
    pub async fn play_sound(&self, guild_id: GuildId, category: &str) -> MusicResult<Track> {
        let session = self.session(guild_id)?;
        let sound = self.load_sound(guild_id, category).await?;

        session.lock().await.play_filler(sound.clone()).await?;
        Ok(sound)
    }
}
