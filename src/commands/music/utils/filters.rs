//! Named audio filter presets applied to a guild's player.

use std::fmt;
use std::str::FromStr;

use super::music_manager::MusicError;

/// Timescale filter parameters; 1.0 everywhere is the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimescaleParams {
    pub pitch: f64,
    pub speed: f64,
    pub rate: f64,
}

/// Vocal suppression parameters for the karaoke filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaraokeParams {
    pub level: f64,
    pub mono_level: f64,
    pub filter_band: f64,
    pub filter_width: f64,
}

/// The full filter set a preset puts on the node. `None` leaves a filter off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterSettings {
    pub timescale: Option<TimescaleParams>,
    pub karaoke: Option<KaraokeParams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPreset {
    #[default]
    Normal,
    Nightcore,
    Sigma,
    Karaoke,
    /// Removes every filter from the player.
    Reset,
}

impl FilterPreset {
    pub const NAMES: [&'static str; 5] = ["normal", "nightcore", "sigma", "karaoke", "reset"];

    pub fn settings(&self) -> FilterSettings {
        let timescale = |pitch, speed| TimescaleParams {
            pitch,
            speed,
            rate: 1.0,
        };

        match self {
            FilterPreset::Normal => FilterSettings {
                timescale: Some(timescale(1.0, 1.0)),
                karaoke: None,
            },
            FilterPreset::Nightcore => FilterSettings {
                timescale: Some(timescale(1.2, 1.2)),
                karaoke: None,
            },
            FilterPreset::Sigma => FilterSettings {
                timescale: Some(timescale(0.8, 0.8)),
                karaoke: None,
            },
            FilterPreset::Karaoke => FilterSettings {
                timescale: None,
                karaoke: Some(KaraokeParams {
                    level: 1.0,
                    mono_level: 1.0,
                    filter_band: 220.0,
                    filter_width: 100.0,
                }),
            },
            FilterPreset::Reset => FilterSettings::default(),
        }
    }

    /// The preset a session reports as active after applying this one.
    pub fn resulting(&self) -> FilterPreset {
        match self {
            FilterPreset::Reset => FilterPreset::Normal,
            preset => *preset,
        }
    }
}

impl FromStr for FilterPreset {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(FilterPreset::Normal),
            "nightcore" => Ok(FilterPreset::Nightcore),
            "sigma" => Ok(FilterPreset::Sigma),
            "karaoke" => Ok(FilterPreset::Karaoke),
            "reset" => Ok(FilterPreset::Reset),
            _ => Err(MusicError::InvalidFilterMode(s.to_string())),
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterPreset::Normal => "normal",
            FilterPreset::Nightcore => "nightcore",
            FilterPreset::Sigma => "sigma",
            FilterPreset::Karaoke => "karaoke",
            FilterPreset::Reset => "reset",
        };
        f.write_str(name)
    }
}
