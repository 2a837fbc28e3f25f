use super::*;
use crate::commands::music::utils::embedded_messages;

/// Pause or resume the player depending on its current state
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("pause", "resume", "t"),
    category = "Music"
)]
pub async fn toggle(ctx: Context<'_>) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;

    let reply = {
        let mut session = session.lock().await;
        let state = session.toggle_pause_resume().await?;
        embedded_messages::toggled(state, session.current())
    };

    acknowledge(ctx, reply).await
}
