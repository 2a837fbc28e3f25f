//! Lyrics lookup through the Genius API.
//!
//! The API only returns song metadata, so the lyrics themselves are scraped
//! from the song page's `data-lyrics-container` blocks.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

pub const GENIUS_API: &str = "https://api.genius.com";

static LYRICS_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div[^>]*data-lyrics-container="true"[^>]*>"#)
        .expect("valid lyrics container pattern")
});
static DIV_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*>").expect("valid div pattern"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Lyrics of one song, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyrics {
    pub title: String,
    pub artist: String,
    pub lyrics: String,
    /// Genius page the lyrics were taken from.
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub response: SearchHits,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHits {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub result: SongResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongResult {
    pub title: String,
    pub url: String,
    pub primary_artist: Artist,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// Genius client; cheap to clone.
#[derive(Debug, Clone)]
pub struct GeniusClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GeniusClient {
    /// Client for the public API. Without a token every lookup fails with
    /// `LyricsProviderError`.
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        Self::with_base_url(GENIUS_API, token, timeout)
    }

    pub fn with_base_url(api_base: &str, token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Finds the best match for `title` and fetches its lyrics.
    pub async fn search_song(&self, title: &str) -> MusicResult<Lyrics> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| MusicError::LyricsProviderError("no Genius token configured".to_string()))?;

        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .query(&[("q", title)])
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(provider_error)?;

        let search: SearchResponse = response.json().await.map_err(provider_error)?;
        let song = search
            .response
            .hits
            .into_iter()
            .next()
            .map(|hit| hit.result)
            .ok_or_else(|| MusicError::LyricsNotFound(title.to_string()))?;

        debug!("Genius matched '{}' to {}", title, song.url);

        let page = self
            .client
            .get(&song.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(provider_error)?
            .text()
            .await
            .map_err(provider_error)?;

        let lyrics = extract_lyrics(&page).ok_or_else(|| MusicError::LyricsNotFound(title.to_string()))?;

        Ok(Lyrics {
            title: song.title,
            artist: song.primary_artist.name,
            lyrics,
            url: song.url,
        })
    }
}

fn provider_error(err: reqwest::Error) -> MusicError {
    warn!("Genius request failed: {}", err);
    if err.is_timeout() {
        MusicError::LyricsProviderError("the lyrics service timed out".to_string())
    } else {
        MusicError::LyricsProviderError(err.to_string())
    }
}

/// Plain-text lyrics from a Genius song page, `None` when the page has none.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let mut blocks = Vec::new();
    let mut rest = html;

    while let Some(open) = LYRICS_CONTAINER.find(rest) {
        let body = &rest[open.end()..];
        let Some(len) = container_len(body) else {
            break;
        };

        let text = LINE_BREAK.replace_all(&body[..len], "\n");
        let text = TAG.replace_all(&text, "");
        blocks.push(decode_entities(&text));
        rest = &body[len..];
    }

    let lyrics = blocks.join("\n").trim().to_string();
    (!lyrics.is_empty()).then_some(lyrics)
}

/// Length of a container's body up to its own closing `</div>`, skipping nested divs.
fn container_len(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for tag in DIV_TAG.captures_iter(body) {
        let closing = tag.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return tag.get(0).map(|whole| whole.start());
            }
        } else {
            depth += 1;
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
