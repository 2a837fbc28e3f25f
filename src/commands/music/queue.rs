use super::*;
use crate::commands::music::utils::embedded_messages;

/// View the current music queue
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("q"),
    category = "Music"
)]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;

    let reply = {
        let session = session.lock().await;
        embedded_messages::music_queue(session.current(), session.queue())
    };

    ctx.send(reply).await?;
    Ok(())
}
