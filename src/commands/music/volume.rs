use super::*;
use crate::commands::music::utils::embedded_messages;

/// Change the volume of the player (0-100)
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("v"),
    category = "Music"
)]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume between 0 and 100"] value: i64,
) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;
    let volume = session.lock().await.set_volume(value).await?;

    acknowledge(ctx, embedded_messages::volume_set(volume)).await
}
