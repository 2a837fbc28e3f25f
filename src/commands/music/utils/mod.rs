use std::time::Duration;

use music_manager::{MusicError, MusicResult};

// Export music utilities
pub mod embedded_messages;
pub mod event_handlers;
pub mod filters;
pub mod music_manager;
pub mod session;
pub mod sound_board;
pub mod track_queue;

/// Format a duration as "MM:SS", or "HH:MM:SS" once it reaches an hour
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Parse a seek position written as "MM:SS" or "HH:MM:SS"
pub fn parse_timestamp(input: &str) -> MusicResult<Duration> {
    let invalid = || MusicError::InvalidSeekFormat(input.to_string());

    let parts = input
        .trim()
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<MusicResult<Vec<u64>>>()?;

    let seconds = match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => minutes * 60 + seconds,
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => {
            hours * 3600 + minutes * 60 + seconds
        }
        _ => return Err(invalid()),
    };

    Ok(Duration::from_secs(seconds))
}
