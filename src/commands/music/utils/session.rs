//! Per-guild playback session: the state machine layered on top of the node's player.
//!
//! A session binds one voice connection to one [`TrackQueue`], one home text
//! channel and a bounded play history. Every operation here is called with the
//! guild's session lock held, so operations on one guild never interleave.

use serenity::all::{ChannelId, GuildId};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::filters::FilterPreset;
use super::music_manager::{MusicError, MusicResult};
use super::track_queue::TrackQueue;
use crate::commands::music::audio_sources::{AudioNode, PlayerHandle, SearchResult, SearchSource, Track};
use crate::config::MusicConfig;

/// Number of previously played tracks a session remembers
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No voice connection; a session in this state has been torn down.
    Idle,
    /// In voice, nothing playing.
    Connected,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Connected => "connected",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// What happens when the current track finishes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayMode {
    /// Advance through the queue, then queue a recommendation once it drains.
    Enabled,
    /// Advance through the queue only.
    #[default]
    Partial,
    /// Stop after every track.
    Disabled,
}

impl FromStr for AutoplayMode {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enabled" | "on" => Ok(AutoplayMode::Enabled),
            "partial" => Ok(AutoplayMode::Partial),
            "disabled" | "off" => Ok(AutoplayMode::Disabled),
            _ => Err(MusicError::InvalidAutoplayMode(s.to_string())),
        }
    }
}

impl fmt::Display for AutoplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutoplayMode::Enabled => "enabled",
            AutoplayMode::Partial => "partial",
            AutoplayMode::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Ring buffer of the last [`HISTORY_LIMIT`] played tracks, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    tracks: VecDeque<Track>,
}

impl History {
    pub fn push(&mut self, track: Track) {
        if self.tracks.len() == HISTORY_LIMIT {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.iter().any(|played| played.is_same(track))
    }

    /// Oldest first
    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

/// Result of a successful `request_play`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// The track went straight to the player.
    Started(Track),
    /// The track waits in the queue at `position` (1-based).
    Queued { track: Track, position: usize },
    /// A playlist was queued; `started` is set when its first track began playing.
    PlaylistQueued {
        name: String,
        count: usize,
        started: Option<Track>,
    },
}

pub struct Session {
    node: Arc<dyn AudioNode>,
    player: PlayerHandle,
    home_channel: Option<ChannelId>,
    current: Option<Track>,
    queue: TrackQueue,
    state: PlaybackState,
    autoplay: AutoplayMode,
    history: History,
    filter: FilterPreset,
    volume: u16,
    // Ambient sound currently on the player; never budgeted, never in history
    filler: Option<Track>,
    fallback_source: SearchSource,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("player", &self.player)
            .field("state", &self.state)
            .field("home_channel", &self.home_channel)
            .field("current", &self.current)
            .field("queued", &self.queue.len())
            .field("autoplay", &self.autoplay)
            .field("filler", &self.filler)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Joins the caller's voice channel and opens a session in `Connected`.
    pub async fn join(
        node: Arc<dyn AudioNode>,
        guild_id: GuildId,
        voice_channel: Option<ChannelId>,
        config: &MusicConfig,
    ) -> MusicResult<Session> {
        let voice_channel = voice_channel.ok_or(MusicError::NotInVoiceChannel)?;

        let player = node
            .connect(guild_id, voice_channel)
            .await
            .map_err(|err| match err {
                MusicError::JoinFailed(_) => err,
                other => MusicError::JoinFailed(other.to_string()),
            })?;

        if let Err(e) = node.set_volume(&player, config.default_volume).await {
            warn!("Failed to set initial volume for guild {}: {}", guild_id, e);
        }

        info!("Joined voice channel {} in guild {}", voice_channel, guild_id);

        Ok(Session {
            node,
            player,
            home_channel: None,
            current: None,
            queue: TrackQueue::new(config.max_queue_duration),
            state: PlaybackState::Connected,
            autoplay: AutoplayMode::default(),
            history: History::default(),
            filter: FilterPreset::default(),
            volume: config.default_volume,
            filler: None,
            fallback_source: config.default_source,
        })
    }

    pub fn guild_id(&self) -> GuildId {
        self.player.guild_id
    }

    pub fn player(&self) -> PlayerHandle {
        self.player
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn home_channel(&self) -> Option<ChannelId> {
        self.home_channel
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    /// Previously played tracks, oldest first
    pub fn history(&self) -> Vec<Track> {
        self.history.to_vec()
    }

    pub fn autoplay(&self) -> AutoplayMode {
        self.autoplay
    }

    pub fn filter(&self) -> FilterPreset {
        self.filter
    }

    pub fn volume(&self) -> u16 {
        self.volume
    }

    pub fn filler(&self) -> Option<&Track> {
        self.filler.as_ref()
    }

    /// Connected with nothing playing, nothing queued and no filler running.
    pub fn is_idle(&self) -> bool {
        self.state == PlaybackState::Connected && self.queue.is_empty() && self.filler.is_none()
    }

    /// Resolves `query` on the node and queues the result.
    ///
    /// The first successful play pins the session to `requester_channel`;
    /// requests from any other text channel are rejected without side effects.
    pub async fn request_play(
        &mut self,
        query: &str,
        requester_channel: ChannelId,
    ) -> MusicResult<PlayOutcome> {
        self.ensure_connected()?;
        if let Some(home) = self.home_channel {
            if home != requester_channel {
                return Err(MusicError::WrongChannel(home));
            }
        }

        let source = SearchSource::sniff(query, self.fallback_source);
        debug!("Searching {} for '{}' in guild {}", source, query, self.guild_id());
        let result = self.node.search(self.guild_id(), query, source).await?;

        let queued = match result {
            SearchResult::Empty => return Err(MusicError::NoTracksFound),
            SearchResult::Playlist { name, tracks } => {
                if tracks.is_empty() {
                    return Err(MusicError::NoTracksFound);
                }
                let count = self.queue.enqueue_many(tracks)?;
                Queued::Playlist { name, count }
            }
            other => {
                let track = other.into_first().ok_or(MusicError::NoTracksFound)?;
                let position = self.queue.enqueue_one(track.clone())?;
                Queued::Single { track, position }
            }
        };

        self.home_channel.get_or_insert(requester_channel);

        let started = if self.state == PlaybackState::Connected {
            self.start_next(false).await?
        } else {
            None
        };

        Ok(match queued {
            Queued::Single { track, position } => match started {
                Some(track) => PlayOutcome::Started(track),
                None => PlayOutcome::Queued { track, position },
            },
            Queued::Playlist { name, count } => PlayOutcome::PlaylistQueued {
                name,
                count,
                started,
            },
        })
    }

    /// Forces the player to the next queued track; returns the skipped track.
    pub async fn skip(&mut self) -> MusicResult<Track> {
        let skipped = self.playing_track()?.clone();
        self.start_next(true).await?;
        Ok(skipped)
    }

    /// `Playing` ⇄ `Paused`; returns the new state.
    pub async fn toggle_pause_resume(&mut self) -> MusicResult<PlaybackState> {
        self.ensure_connected()?;
        let (paused, next) = match self.state {
            PlaybackState::Playing => (true, PlaybackState::Paused),
            PlaybackState::Paused => (false, PlaybackState::Playing),
            _ => return Err(MusicError::NothingPlaying),
        };

        self.node.set_paused(&self.player, paused).await?;
        self.state = next;
        Ok(next)
    }

    /// Sets the player volume; values outside 0..=100 are rejected, not clamped.
    pub async fn set_volume(&mut self, volume: i64) -> MusicResult<u16> {
        self.ensure_connected()?;
        let volume = u16::try_from(volume)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(MusicError::InvalidVolume(volume))?;

        self.node.set_volume(&self.player, volume).await?;
        self.volume = volume;
        Ok(volume)
    }

    pub async fn set_filter(&mut self, preset: FilterPreset) -> MusicResult<FilterPreset> {
        self.ensure_connected()?;
        self.node.set_filters(&self.player, preset).await?;
        self.filter = preset.resulting();
        Ok(self.filter)
    }

    pub fn set_autoplay(&mut self, mode: AutoplayMode) -> MusicResult<()> {
        self.ensure_connected()?;
        self.autoplay = mode;
        Ok(())
    }

    pub async fn seek(&mut self, position: Duration) -> MusicResult<Track> {
        let track = self.playing_track()?.clone();
        if position > track.length {
            return Err(MusicError::SeekOutOfRange {
                requested: position,
                length: track.length,
            });
        }

        self.node.seek(&self.player, position).await?;
        Ok(track)
    }

    /// Playback position of the current track, as reported by the node.
    pub async fn position(&self) -> MusicResult<Duration> {
        self.playing_track()?;
        self.node.position(&self.player).await
    }

    /// Leaves voice and releases everything the session holds. Terminal.
    pub async fn disconnect(&mut self) -> MusicResult<()> {
        if self.state == PlaybackState::Idle {
            return Err(MusicError::NoActiveSession);
        }

        let result = self.node.disconnect(&self.player).await;
        self.queue.clear();
        self.history.clear();
        self.current = None;
        self.filler = None;
        self.home_channel = None;
        self.state = PlaybackState::Idle;
        info!("Session for guild {} torn down", self.guild_id());
        result
    }

    /// Plays a filler sound while the session has nothing else to do.
    pub async fn play_filler(&mut self, filler: Track) -> MusicResult<()> {
        self.ensure_connected()?;
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return Err(MusicError::PlayerBusy);
        }

        self.node.play(&self.player, &filler).await?;
        debug!("Playing filler '{}' in guild {}", filler.title, self.guild_id());
        self.filler = Some(filler);
        Ok(())
    }

    /// Plays `filler` only if nothing at all is playing, a running filler included.
    /// Returns whether it was started.
    pub async fn play_filler_when_idle(&mut self, filler: Track) -> MusicResult<bool> {
        if !self.is_idle() {
            return Ok(false);
        }
        self.play_filler(filler).await?;
        Ok(true)
    }

    /// The inactivity timer fired; returns whether the filler was started.
    ///
    /// Only an idle session reacts, and the playback state is left untouched.
    pub async fn on_inactivity_elapsed(&mut self, filler: Track) -> MusicResult<bool> {
        self.play_filler_when_idle(filler).await
    }

    /// The node started `track`. Returns the track when it is the one the
    /// session put on the player, so it can be announced.
    ///
    /// Only the session decides what is current; a start for anything else
    /// arrived after the session moved on and changes nothing.
    pub fn on_track_started(&mut self, track: Track) -> Option<Track> {
        if self.state == PlaybackState::Idle {
            debug!("Ignoring track start for torn-down session");
            return None;
        }
        if self.filler.as_ref().is_some_and(|f| f.is_same(&track)) {
            return None;
        }
        match &self.current {
            Some(current) if current.is_same(&track) => Some(track),
            _ => {
                debug!("Ignoring stale track start for '{}'", track.title);
                None
            }
        }
    }

    /// The node finished `track`. `may_start_next` is false when the end was
    /// caused by a stop or a replacement rather than the track running out.
    pub async fn on_track_ended(&mut self, track: Track, may_start_next: bool) -> MusicResult<()> {
        if self.state == PlaybackState::Idle {
            return Ok(());
        }

        if self.filler.as_ref().is_some_and(|f| f.is_same(&track)) {
            self.filler = None;
            if self.state == PlaybackState::Connected && !self.queue.is_empty() {
                self.start_next(false).await?;
            }
            return Ok(());
        }

        // Stale end of a track we already moved past
        if !self.current.as_ref().is_some_and(|c| c.is_same(&track)) || !may_start_next {
            return Ok(());
        }

        match self.autoplay {
            AutoplayMode::Disabled => {
                self.retire_current();
                self.state = PlaybackState::Connected;
            }
            AutoplayMode::Partial => {
                self.start_next(false).await?;
            }
            AutoplayMode::Enabled => {
                if self.queue.is_empty() {
                    self.queue_recommendation(&track).await;
                }
                self.start_next(false).await?;
            }
        }
        Ok(())
    }

    fn ensure_connected(&self) -> MusicResult<()> {
        match self.state {
            PlaybackState::Idle => Err(MusicError::NoActiveSession),
            _ => Ok(()),
        }
    }

    fn playing_track(&self) -> MusicResult<&Track> {
        self.ensure_connected()?;
        match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.current.as_ref().ok_or(MusicError::NothingPlaying)
            }
            _ => Err(MusicError::NothingPlaying),
        }
    }

    fn retire_current(&mut self) {
        if let Some(track) = self.current.take() {
            self.history.push(track);
        }
    }

    /// Moves the queue head onto the player, or goes back to `Connected` when
    /// the queue is empty. `stop_when_empty` halts a track that is still running.
    async fn start_next(&mut self, stop_when_empty: bool) -> MusicResult<Option<Track>> {
        match self.queue.dequeue_next() {
            Some(track) => {
                self.node.play(&self.player, &track).await?;
                self.filler = None;
                self.retire_current();
                self.current = Some(track.clone());
                if self.state == PlaybackState::Connected {
                    self.state = PlaybackState::Playing;
                }
                info!("Now playing '{}' in guild {}", track.title, self.guild_id());
                Ok(Some(track))
            }
            None => {
                if stop_when_empty {
                    self.node.stop(&self.player).await?;
                }
                if self.state == PlaybackState::Paused {
                    self.node.set_paused(&self.player, false).await?;
                }
                self.retire_current();
                self.state = PlaybackState::Connected;
                debug!("Queue drained in guild {}", self.guild_id());
                Ok(None)
            }
        }
    }

    /// Queues one track by the same author that has not been played recently.
    async fn queue_recommendation(&mut self, finished: &Track) {
        let results = match self
            .node
            .search(self.guild_id(), &finished.author, self.fallback_source)
            .await
        {
            Ok(SearchResult::Track(track)) => vec![track],
            Ok(SearchResult::Search(tracks)) | Ok(SearchResult::Playlist { tracks, .. }) => tracks,
            Ok(SearchResult::Empty) => Vec::new(),
            Err(e) => {
                warn!("Autoplay search failed in guild {}: {}", self.guild_id(), e);
                return;
            }
        };

        let recommendation = results
            .into_iter()
            .find(|candidate| !candidate.is_same(finished) && !self.history.contains(candidate));

        match recommendation {
            Some(track) => {
                info!("Autoplay queued '{}' in guild {}", track.title, self.guild_id());
                if let Err(e) = self.queue.enqueue_one(track) {
                    debug!("Autoplay recommendation rejected: {}", e);
                }
            }
            None => debug!("No autoplay recommendation for '{}'", finished.author),
        }
    }
}

enum Queued {
    Single { track: Track, position: usize },
    Playlist { name: String, count: usize },
}
