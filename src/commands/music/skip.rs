use super::*;
use crate::commands::music::utils::embedded_messages;

/// Skip the currently playing song
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("s"),
    category = "Music"
)]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;
    let skipped = session.lock().await.skip().await?;

    acknowledge(ctx, embedded_messages::skipped(&skipped)).await
}
