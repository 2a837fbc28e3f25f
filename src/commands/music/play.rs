use super::*;
use crate::commands::music::utils::embedded_messages;
use tracing::{info, warn};

/// Play a song or playlist from a link or search query
///
/// Joins your voice channel on first use. Links are played as-is; queries
/// mentioning youtube, soundcloud or spotify are searched there.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("p"),
    category = "Music"
)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = guild_id(ctx)?;
    let voice_channel = caller_voice_channel(ctx);

    // Searching can take a moment
    ctx.defer().await?;

    let session = ctx
        .data()
        .music
        .session_or_join(guild_id, voice_channel)
        .await?;
    let outcome = session
        .lock()
        .await
        .request_play(&query, ctx.channel_id())
        .await?;

    ctx.send(embedded_messages::play_outcome(&outcome)).await?;

    if let poise::Context::Prefix(prefix) = ctx {
        if let Err(e) = prefix.msg.delete(ctx).await {
            warn!("Could not delete play request message: {}", e);
        }
    }

    Ok(())
}
