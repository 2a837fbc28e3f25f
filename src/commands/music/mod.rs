pub(crate) mod autoplay;
pub(crate) mod disconnect;
pub(crate) mod filter;
pub(crate) mod history;
pub(crate) mod lyrics;
pub(crate) mod now_playing;
pub(crate) mod play;
pub(crate) mod play_sound;
pub(crate) mod queue;
pub(crate) mod seek;
pub(crate) mod skip;
pub(crate) mod toggle;
pub(crate) mod volume;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{ChannelId, GuildId, ReactionType};
use utils::music_manager::{MusicError, MusicResult};

/// Every music command, in help order
pub fn commands() -> Vec<poise::Command<crate::Data, crate::Error>> {
    vec![
        play::play(),
        skip::skip(),
        toggle::toggle(),
        volume::volume(),
        filter::filter(),
        seek::seek(),
        now_playing::now_playing(),
        queue::queue(),
        history::history(),
        autoplay::autoplay(),
        play_sound::play_sound(),
        lyrics::lyrics(),
        disconnect::disconnect(),
    ]
}

pub(crate) fn guild_id(ctx: Context<'_>) -> MusicResult<GuildId> {
    ctx.guild_id().ok_or(MusicError::NotInGuild)
}

/// The voice channel the command's author is sitting in, from the cache.
pub(crate) fn caller_voice_channel(ctx: Context<'_>) -> Option<ChannelId> {
    let guild = ctx.guild()?;
    guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|state| state.channel_id)
}

/// Confirms a control command: a ❤️ reaction for prefix invocations, `reply`
/// for slash invocations.
pub(crate) async fn acknowledge(ctx: Context<'_>, reply: CreateReply) -> CommandResult {
    match ctx {
        poise::Context::Prefix(prefix) => {
            prefix
                .msg
                .react(ctx, ReactionType::Unicode("❤️".to_string()))
                .await?;
        }
        poise::Context::Application(_) => {
            ctx.send(reply).await?;
        }
    }
    Ok(())
}
