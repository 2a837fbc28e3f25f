use super::*;
use crate::commands::music::utils::embedded_messages;
use tracing::info;

/// Leave the voice channel and clear the queue
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("dc", "leave", "stop"),
    category = "Music"
)]
pub async fn disconnect(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    ctx.data().music.teardown(guild_id).await?;
    info!("Disconnected from guild {} on request", guild_id);

    acknowledge(ctx, embedded_messages::disconnected()).await
}
