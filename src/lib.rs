//! A Discord music bot that leaves the audio work to a Lavalink node.

use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::error;

pub mod commands;
pub mod config;
pub mod events;
pub mod keep_alive;
pub mod utils;

use commands::music::utils::embedded_messages;
use commands::music::utils::music_manager::{MusicError, MusicManager};
use utils::genius::GeniusClient;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub music: Arc<MusicManager>,
    pub lyrics: GeniusClient,
}

#[poise::command(prefix_command, slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// All commands the framework is built with
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    let mut commands = vec![register(), help()];
    commands.extend(commands::music::commands());
    commands
}

/// Turns every command failure into a reply; nothing here may bring the bot down.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = match error.downcast_ref::<MusicError>() {
                Some(music_error) => embedded_messages::music_error(music_error),
                None => {
                    error!("Error in command `{}`: {}", ctx.command().qualified_name, error);
                    embedded_messages::generic_error()
                }
            };
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to report command error: {}", e);
            }
        }
        poise::FrameworkError::UnknownCommand {
            ctx, msg, prefix, ..
        } => {
            let reply = format!("Command not found. Try saying `{}help`.", prefix);
            if let Err(e) = msg.reply(ctx, reply).await {
                error!("Failed to answer unknown command: {}", e);
            }
        }
        poise::FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let usage = match &ctx.command().help_text {
                Some(help) => help.clone(),
                None => "Try `help` for usage.".to_string(),
            };
            let message = match input {
                Some(input) => format!("Could not understand `{}`: {}\n{}", input, error, usage),
                None => format!("{}\n{}", error, usage),
            };
            if let Err(e) = ctx.say(message).await {
                error!("Failed to report argument error: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Framework options shared by the bot binary: prefix, commands and error hook.
pub fn framework_options(prefix: &str) -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: commands(),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    }
}

/// Intents the bot needs: prefix commands read message content, and the
/// voice-state cache locates the caller's channel.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES
}
