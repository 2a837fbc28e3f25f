//! Defines the `autoplay` command for choosing what happens when a song ends.

use super::*;
use crate::commands::music::utils::{embedded_messages, session::AutoplayMode};

/// Show or change the autoplay mode: enabled, partial or disabled.
///
/// `enabled` keeps the music going with a similar song once the queue runs
/// out, `partial` plays through the queue and stops, `disabled` stops after
/// every song. Without an argument the current mode is shown.
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn autoplay(
    ctx: Context<'_>,
    #[description = "enabled, partial or disabled"] mode: Option<String>,
) -> CommandResult {
    let session = ctx.data().music.session(guild_id(ctx)?)?;

    let mode = {
        let mut session = session.lock().await;
        match mode {
            Some(mode) => {
                let mode: AutoplayMode = mode.parse()?;
                session.set_autoplay(mode)?;
                mode
            }
            None => session.autoplay(),
        }
    };

    ctx.send(embedded_messages::autoplay_status(mode)).await?;
    Ok(())
}
