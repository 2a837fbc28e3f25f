use futures::Stream;

use super::*;
use crate::commands::music::utils::embedded_messages;

/// Play a short sound from the sound board while nothing else is playing
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("sound"),
    category = "Music"
)]
pub async fn play_sound(
    ctx: Context<'_>,
    #[description = "Sound category, e.g. welcome or idle"]
    #[autocomplete = "autocomplete_sound"]
    category: String,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let music = &ctx.data().music;

    // Reject unknown sounds before joining anything
    music.sounds().pick(&category)?;
    music
        .session_or_join(guild_id, caller_voice_channel(ctx))
        .await?;
    let sound = music.play_sound(guild_id, &category).await?;

    ctx.send(embedded_messages::sound_playing(&category, &sound))
        .await?;
    Ok(())
}

async fn autocomplete_sound<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let categories: Vec<String> = ctx
        .data()
        .music
        .sounds()
        .categories()
        .into_iter()
        .map(str::to_string)
        .collect();

    futures::stream::iter(
        categories
            .into_iter()
            .filter(move |category| category.starts_with(partial)),
    )
}
