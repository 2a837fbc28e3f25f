use super::*;
use crate::commands::music::utils::embedded_messages;

/// Show the last songs played in this server
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn history(ctx: Context<'_>) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;
    let played = session.lock().await.history();

    ctx.send(embedded_messages::history(&played)).await?;
    Ok(())
}
