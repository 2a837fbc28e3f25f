//! Runtime configuration, read from the environment (and `.env` through `dotenv`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::commands::music::audio_sources::SearchSource;
use crate::commands::music::utils::sound_board::SoundBoard;
use crate::commands::music::utils::track_queue::DEFAULT_MAX_QUEUE_DURATION;

pub const DEFAULT_PREFIX: &str = "w!";
pub const DEFAULT_VOLUME: u16 = 30;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LYRICS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Mode::Production),
            "development" | "dev" => Ok(Mode::Development),
            other => Err(format!("expected production or development, got `{}`", other)),
        }
    }
}

/// Where the Lavalink node lives.
#[derive(Debug, Clone, PartialEq)]
pub struct LavalinkConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub ssl: bool,
}

impl Default for LavalinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2333,
            password: "youshallnotpass".to_string(),
            ssl: false,
        }
    }
}

/// Settings every playback session is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicConfig {
    pub max_queue_duration: Duration,
    /// How long a session may sit idle before a filler sound plays. Zero disables it.
    pub idle_timeout: Duration,
    pub search_timeout: Duration,
    pub default_volume: u16,
    /// Search scope for queries that don't name a platform.
    pub default_source: SearchSource,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            max_queue_duration: DEFAULT_MAX_QUEUE_DURATION,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            default_volume: DEFAULT_VOLUME,
            default_source: SearchSource::SoundCloud,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub mode: Mode,
    pub prefix: String,
    pub lavalink: LavalinkConfig,
    pub music: MusicConfig,
    pub genius_token: Option<String>,
    pub lyrics_timeout: Duration,
    pub avatar_path: Option<PathBuf>,
    /// Port of the HTTP liveness endpoint; unset disables it.
    pub keep_alive_port: Option<u16>,
    pub sounds: SoundBoard,
}

impl Config {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let discord_token = get("DISCORD_TOKEN")
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?
            .to_string();

        let lavalink_defaults = LavalinkConfig::default();
        let lavalink = LavalinkConfig {
            host: get("LAVALINK_HOST")
                .map(str::to_string)
                .unwrap_or(lavalink_defaults.host),
            port: parse(get, "LAVALINK_PORT")?.unwrap_or(lavalink_defaults.port),
            password: get("LAVALINK_PASSWORD")
                .map(str::to_string)
                .unwrap_or(lavalink_defaults.password),
            ssl: parse(get, "LAVALINK_SSL")?.unwrap_or(lavalink_defaults.ssl),
        };

        let default_volume = parse(get, "DEFAULT_VOLUME")?.unwrap_or(DEFAULT_VOLUME);
        if default_volume > 100 {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_VOLUME",
                value: default_volume.to_string(),
                reason: "must be between 0 and 100".to_string(),
            });
        }

        let music = MusicConfig {
            max_queue_duration: seconds(get, "MAX_QUEUE_DURATION_SECS")?
                .unwrap_or(DEFAULT_MAX_QUEUE_DURATION),
            idle_timeout: seconds(get, "IDLE_TIMEOUT_SECS")?.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            search_timeout: seconds(get, "SEARCH_TIMEOUT_SECS")?.unwrap_or(DEFAULT_SEARCH_TIMEOUT),
            default_volume,
            default_source: parse(get, "DEFAULT_SEARCH_SOURCE")?
                .unwrap_or(SearchSource::SoundCloud),
        };

        Ok(Self {
            discord_token,
            mode: parse(get, "MODE")?.unwrap_or_default(),
            prefix: get("PREFIX").unwrap_or(DEFAULT_PREFIX).to_string(),
            lavalink,
            music,
            genius_token: get("GENIUS_TOKEN").map(str::to_string),
            lyrics_timeout: seconds(get, "LYRICS_TIMEOUT_SECS")?.unwrap_or(DEFAULT_LYRICS_TIMEOUT),
            avatar_path: get("AVATAR_PATH").map(PathBuf::from),
            keep_alive_port: parse(get, "KEEP_ALIVE_PORT")?,
            sounds: SoundBoard::from_vars(vars.clone()),
        })
    }
}

fn parse<'a, T>(
    get: impl Fn(&str) -> Option<&'a str>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|value| {
            value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: value.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn seconds<'a>(
    get: impl Fn(&str) -> Option<&'a str>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse::<u64>(get, key)?.map(Duration::from_secs))
}
