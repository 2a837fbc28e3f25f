use super::*;
use crate::commands::music::utils::embedded_messages;
use tracing::debug;

/// Show the lyrics of a song, or of the current song when no title is given
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("lyric"),
    category = "Music"
)]
pub async fn lyrics(
    ctx: Context<'_>,
    #[description = "Song title"]
    #[rest]
    title: Option<String>,
) -> CommandResult {
    let title = match title.filter(|title| !title.trim().is_empty()) {
        Some(title) => title,
        None => {
            let session = ctx.data().music.session(guild_id(ctx)?)?;
            let session = session.lock().await;
            let track = session.current().ok_or(MusicError::NothingPlaying)?;
            format!("{} {}", track.title, track.author)
        }
    };

    ctx.send(embedded_messages::searching_lyrics(&title)).await?;
    debug!("Looking up lyrics for '{}'", title);

    let lyrics = ctx.data().lyrics.search_song(&title).await?;
    ctx.send(embedded_messages::lyrics(&lyrics)).await?;
    Ok(())
}
