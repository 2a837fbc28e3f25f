use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedFooter};
use std::time::Duration;

use super::filters::FilterPreset;
use super::session::{AutoplayMode, PlayOutcome, PlaybackState};
use super::track_queue::TrackQueue;
use super::{format_duration, music_manager::MusicError};
use crate::commands::music::audio_sources::Track;
use crate::utils::genius::Lyrics;

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;
/// Discord rejects embeds with more fields than this
const MAX_FIELDS: usize = 25;
/// Discord's limit for an embed description
pub const MAX_DESCRIPTION: usize = 4096;

/// Create a progress bar for the current track
fn format_progress_bar(position: Duration, total: Duration) -> String {
    const BAR_LENGTH: usize = 15;
    let progress = if total.as_secs() == 0 {
        0.0
    } else {
        (position.as_secs_f64() / total.as_secs_f64()).min(1.0)
    };

    let filled = (progress * BAR_LENGTH as f64).round() as usize;
    let empty = BAR_LENGTH - filled;

    format!("▬{}🔘{}▬", "▬".repeat(filled), "▬".repeat(empty))
}

/// Numbered `(name, value)` pairs for the queued tracks, in play order
fn queue_fields(tracks: &[Track]) -> Vec<(String, String)> {
    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            (
                format!("{}. {}", index + 1, track.title),
                format!("by {} `{}`", track.author, format_duration(track.length)),
            )
        })
        .collect()
}

/// Cut `text` to at most `limit` characters, marking the cut with an ellipsis
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn track_embed(title: &str, track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(title)
        .description(track.markdown_link())
        .field("Artist", &track.author, true)
        .field("Duration", format!("`{}`", format_duration(track.length)), true)
        .color(SUCCESS);

    if let Some(album) = &track.album {
        embed = embed.field("Album", album, true);
    }
    if let Some(artwork) = &track.artwork_url {
        embed = embed.thumbnail(artwork);
    }
    embed
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &Track) -> CreateEmbed {
    track_embed("🎵 Now Playing", track)
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(track: &Track, position: usize) -> CreateEmbed {
    track_embed("🎵 Added to Queue", track).field("Position", format!("`#{}`", position), true)
}

pub fn playlist_added(name: &str, count: usize) -> CreateEmbed {
    CreateEmbed::new()
        .title("📋 Playlist Added")
        .description(format!("Added **{}** tracks from **{}**", count, name))
        .color(SUCCESS)
}

/// Reply for a successful `play`
pub fn play_outcome(outcome: &PlayOutcome) -> CreateReply {
    match outcome {
        PlayOutcome::Started(track) => CreateReply::default().embed(now_playing(track)),
        PlayOutcome::Queued { track, position } => {
            CreateReply::default().embed(added_to_queue(track, *position))
        }
        PlayOutcome::PlaylistQueued {
            name,
            count,
            started,
        } => {
            let reply = CreateReply::default().embed(playlist_added(name, *count));
            match started {
                Some(track) => reply.embed(now_playing(track)),
                None => reply,
            }
        }
    }
}

/// Create an embed for the music queue
pub fn music_queue(current: Option<&Track>, queue: &TrackQueue) -> CreateReply {
    let description = match current {
        Some(track) => format!("**Now playing:** {}", track.markdown_link()),
        None => "**🔇 Nothing playing**".to_string(),
    };

    let mut embed = CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(description)
        .color(SUCCESS);

    if queue.is_empty() {
        embed = embed.field("📭 Queue is empty", "Add songs with `play`", false);
    } else {
        let tracks = queue.peek_all();
        let shown = MAX_FIELDS - 1;
        for (name, value) in queue_fields(&tracks).into_iter().take(shown) {
            embed = embed.field(name, value, false);
        }
        if tracks.len() > shown {
            embed = embed.field("…", format!("and {} more", tracks.len() - shown), false);
        }
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "{} tracks, total {} of {}",
            tracks.len(),
            format_duration(queue.total_duration()),
            format_duration(queue.max_duration())
        )));
    }

    CreateReply::default().embed(embed)
}

/// Previously played tracks, most recent first
pub fn history(tracks: &[Track]) -> CreateReply {
    let mut embed = CreateEmbed::new().title("🕘 History").color(SUCCESS);

    if tracks.is_empty() {
        embed = embed.description("Nothing has been played yet");
    } else {
        let recent_first: Vec<Track> = tracks.iter().rev().cloned().collect();
        for (name, value) in queue_fields(&recent_first) {
            embed = embed.field(name, value, false);
        }
    }

    CreateReply::default().embed(embed)
}

/// Now playing with a progress bar
pub fn now_playing_detail(track: &Track, position: Duration, state: PlaybackState) -> CreateReply {
    let progress = format!(
        "{} `{}/{}`",
        format_progress_bar(position, track.length),
        format_duration(position),
        format_duration(track.length)
    );
    let title = match state {
        PlaybackState::Paused => "⏸️ Paused",
        _ => "🎵 Now Playing",
    };

    CreateReply::default().embed(track_embed(title, track).field("Progress", progress, false))
}

/// Create an embed for when a track is paused or resumed
pub fn toggled(state: PlaybackState, track: Option<&Track>) -> CreateReply {
    let (title, verb) = match state {
        PlaybackState::Paused => ("⏸️ Paused", "Paused"),
        _ => ("▶️ Resumed", "Resumed"),
    };
    let description = match track {
        Some(track) => format!("{} {}", verb, track.markdown_link()),
        None => verb.to_string(),
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(SUCCESS),
    )
}

/// Create an embed for when a track is skipped
pub fn skipped(track: &Track) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏭️ Skipped")
            .description(format!("Skipped {}", track.markdown_link()))
            .color(SUCCESS),
    )
}

pub fn volume_set(volume: u16) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔊 Volume")
            .description(format!("Volume set to **{}%**", volume))
            .color(SUCCESS),
    )
}

pub fn filter_applied(preset: FilterPreset) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎛️ Filter")
            .description(format!("Filter set to **{}**", preset))
            .color(SUCCESS),
    )
}

pub fn seeked(track: &Track, position: Duration) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏩ Seeked")
            .description(format!(
                "Moved {} to `{}`",
                track.markdown_link(),
                format_duration(position)
            ))
            .color(SUCCESS),
    )
}

/// Create an embed for the autoplay mode
pub fn autoplay_status(mode: AutoplayMode) -> CreateReply {
    let description = match mode {
        AutoplayMode::Enabled => {
            "I will play through the queue and add a similar song when it runs out"
        }
        AutoplayMode::Partial => "I will play through the queue and stop when it runs out",
        AutoplayMode::Disabled => "I will stop after every song",
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title(format!("🔄 Autoplay {}", mode))
            .description(description)
            .color(SUCCESS),
    )
}

pub fn sound_playing(category: &str, sound: &Track) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔔 Sound")
            .description(format!("Playing `{}`: {}", category, sound.markdown_link()))
            .color(SUCCESS),
    )
}

/// Create an embed for when the bot leaves a voice channel
pub fn disconnected() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("👋 Left Voice Channel")
            .description("Successfully disconnected and cleared the queue")
            .color(SUCCESS),
    )
}

pub fn searching_lyrics(title: &str) -> CreateReply {
    CreateReply::default().content(format!("Searching for lyrics of **{}**...", title))
}

pub fn lyrics(lyrics: &Lyrics) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(format!("🎤 {} by {}", lyrics.title, lyrics.artist))
            .url(&lyrics.url)
            .description(truncate(&lyrics.lyrics, MAX_DESCRIPTION))
            .color(SUCCESS),
    )
}

/// The embed every failed music command replies with
pub fn music_error(err: &MusicError) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(err.to_string())
                .color(FAILURE),
        )
        .ephemeral(true)
}

pub fn generic_error() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description("Something went wrong while running that command. Please try again later.")
                .color(FAILURE),
        )
        .ephemeral(true)
}
