use futures::Stream;

use super::*;
use crate::commands::music::utils::{embedded_messages, filters::FilterPreset};

/// Apply an audio filter: normal, nightcore, sigma, karaoke or reset
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("f"),
    category = "Music"
)]
pub async fn filter(
    ctx: Context<'_>,
    #[description = "normal, nightcore, sigma, karaoke or reset"]
    #[autocomplete = "autocomplete_filter"]
    mode: String,
) -> CommandResult {
    let preset: FilterPreset = mode.parse()?;
    let session = ctx.data().music.session(guild_id(ctx)?)?;
    let applied = session.lock().await.set_filter(preset).await?;

    acknowledge(ctx, embedded_messages::filter_applied(applied)).await
}

async fn autocomplete_filter<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let partial = partial.to_lowercase();
    futures::stream::iter(
        FilterPreset::NAMES
            .into_iter()
            .filter(move |name| name.starts_with(partial.as_str()))
            .map(str::to_string),
    )
}
