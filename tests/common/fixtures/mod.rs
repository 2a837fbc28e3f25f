//! Sample data and configurations used in tests

use lavabot::commands::music::audio_sources::{SearchResult, SearchSource, Track};
use lavabot::commands::music::utils::sound_board::SoundBoard;
use lavabot::config::MusicConfig;
use serenity::all::{ChannelId, GuildId};
use std::time::Duration;

pub const GUILD_ID: u64 = 111_111_111;
pub const VOICE_CHANNEL_ID: u64 = 222_222_222;
pub const HOME_CHANNEL_ID: u64 = 333_333_333;
pub const OTHER_CHANNEL_ID: u64 = 444_444_444;

/// Filler identifiers used by the sound board fixtures
pub const WELCOME_SOUND: &str = "https://sounds.example.com/welcome.mp3";
pub const IDLE_SOUND: &str = "https://sounds.example.com/rain.mp3";

pub fn guild() -> GuildId {
    GuildId::new(GUILD_ID)
}

pub fn voice() -> ChannelId {
    ChannelId::new(VOICE_CHANNEL_ID)
}

pub fn home() -> ChannelId {
    ChannelId::new(HOME_CHANNEL_ID)
}

pub fn other_channel() -> ChannelId {
    ChannelId::new(OTHER_CHANNEL_ID)
}

pub fn track_ms(title: &str, millis: u64) -> Track {
    Track {
        title: title.to_string(),
        author: "Test Artist".to_string(),
        length: Duration::from_millis(millis),
        uri: Some(format!("https://soundcloud.com/test-artist/{}", title)),
        album: None,
        artwork_url: None,
        source_name: "soundcloud".to_string(),
        encoded: format!("encoded:{}", title),
    }
}

/// A three minute track
pub fn track(title: &str) -> Track {
    track_ms(title, 180_000)
}

pub fn by(author: &str, title: &str) -> Track {
    Track {
        author: author.to_string(),
        ..track(title)
    }
}

pub fn music_config() -> MusicConfig {
    MusicConfig {
        max_queue_duration: Duration::from_millis(7_200_000),
        idle_timeout: Duration::from_secs(300),
        search_timeout: Duration::from_secs(5),
        default_volume: 30,
        default_source: SearchSource::SoundCloud,
    }
}

/// Sound board with no welcome and no idle sound, so nothing plays on its own
pub fn silent_sounds() -> SoundBoard {
    SoundBoard::from_vars(vec![
        ("SOUND_WELCOME".to_string(), String::new()),
        ("SOUND_IDLE".to_string(), String::new()),
    ])
}

pub fn sounds(welcome: bool, idle: bool) -> SoundBoard {
    let pick = |enabled: bool, sound: &str| if enabled { sound.to_string() } else { String::new() };
    SoundBoard::from_vars(vec![
        ("SOUND_WELCOME".to_string(), pick(welcome, WELCOME_SOUND)),
        ("SOUND_IDLE".to_string(), pick(idle, IDLE_SOUND)),
    ])
}

/// Search catalog entry resolving `query` to a single track
pub fn found(query: &str, track: Track) -> (String, SearchResult) {
    (query.to_string(), SearchResult::Search(vec![track]))
}
