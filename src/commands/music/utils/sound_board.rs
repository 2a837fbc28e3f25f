//! Named categories of short filler sounds (welcome jingle, idle ambience, ...).

use rand::seq::IndexedRandom;
use std::collections::HashMap;

use super::music_manager::{MusicError, MusicResult};

/// Played once right after the bot joins a voice channel.
pub const WELCOME: &str = "welcome";
/// Played when a connected session has been idle for too long.
pub const IDLE: &str = "idle";

/// Environment variables starting with this prefix define a category.
const ENV_PREFIX: &str = "SOUND_";

#[derive(Debug, Clone, PartialEq)]
pub struct SoundBoard {
    // Category name -> Lavalink identifiers (links or `xxsearch:` queries)
    categories: HashMap<String, Vec<String>>,
}

impl Default for SoundBoard {
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert(
            WELCOME.to_string(),
            vec!["scsearch:discord join sound effect".to_string()],
        );
        categories.insert(
            IDLE.to_string(),
            vec![
                "scsearch:lofi rain ambience".to_string(),
                "scsearch:coffee shop ambience".to_string(),
                "scsearch:crackling fireplace ambience".to_string(),
            ],
        );
        Self { categories }
    }
}

impl SoundBoard {
    /// Builds the board from `SOUND_<CATEGORY>=id1,id2` pairs on top of the defaults.
    ///
    /// A variable with no usable entries removes the category.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut board = Self::default();

        for (key, value) in vars {
            let Some(category) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let category = category.to_lowercase();
            if category.is_empty() {
                continue;
            }

            let entries: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();

            if entries.is_empty() {
                board.categories.remove(&category);
            } else {
                board.categories.insert(category, entries);
            }
        }

        board
    }

    /// A random identifier from `category`
    pub fn pick(&self, category: &str) -> MusicResult<&str> {
        self.categories
            .get(&category.trim().to_lowercase())
            .and_then(|entries| entries.choose(&mut rand::rng()))
            .map(String::as_str)
            .ok_or_else(|| MusicError::UnknownSound(category.to_string()))
    }

    /// Category names, sorted for display
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn entries(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }
}
