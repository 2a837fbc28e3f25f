use super::*;
use crate::commands::music::utils::{embedded_messages, parse_timestamp};

/// Jump to a position in the current song (MM:SS or HH:MM:SS)
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn seek(
    ctx: Context<'_>,
    #[description = "Position as MM:SS or HH:MM:SS"] position: String,
) -> CommandResult {
    let position = parse_timestamp(&position)?;
    let session = ctx.data().music.session(guild_id(ctx)?)?;
    let track = session.lock().await.seek(position).await?;

    ctx.send(embedded_messages::seeked(&track, position)).await?;
    Ok(())
}
