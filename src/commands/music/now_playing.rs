use super::*;
use crate::commands::music::utils::embedded_messages;

/// Show the current song and how far into it the player is
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("np"),
    category = "Music"
)]
pub async fn now_playing(ctx: Context<'_>) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;

    let reply = {
        let session = session.lock().await;
        let position = session.position().await?;
        let track = session.current().ok_or(MusicError::NothingPlaying)?;
        embedded_messages::now_playing_detail(track, position, session.state())
    };

    ctx.send(reply).await?;
    Ok(())
}
