use ::serenity::all::{ClientBuilder, CreateAttachment, EditProfile, Http};
use dotenv::dotenv;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lavabot::commands::music::audio_sources::lavalink::LavalinkNode;
use lavabot::commands::music::utils::{event_handlers, music_manager::MusicManager};
use lavabot::config::{Config, Mode};
use lavabot::events::Handler;
use lavabot::keep_alive;
use lavabot::utils::genius::GeniusClient;
use lavabot::{Data, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();
    let config = Config::from_env()?;

    // Initialize logging with debug level for our crate, trace while developing
    let default_filter = match config.mode {
        Mode::Production => "lavabot=debug,lavalink_rs=info,warn",
        Mode::Development => "lavabot=trace,lavalink_rs=debug,info",
    };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    if let Some(port) = config.keep_alive_port {
        let listener = keep_alive::bind(port).await?;
        tokio::spawn(async move {
            if let Err(e) = keep_alive::serve(listener).await {
                error!("Keep-alive endpoint stopped: {}", e);
            }
        });
    }

    let bot_id = Http::new(&config.discord_token).get_current_user().await?.id;
    info!("Starting as bot user {}", bot_id);

    let songbird = Songbird::serenity();
    let (node_events, node_events_rx) = mpsc::unbounded_channel();
    let node = LavalinkNode::connect(
        &config.lavalink,
        bot_id,
        Arc::clone(&songbird),
        config.music.search_timeout,
        node_events,
    )
    .await;

    let music = Arc::new(
        MusicManager::new(Arc::new(node), config.music.clone(), config.sounds.clone())
            .with_http(Arc::new(Http::new(&config.discord_token))),
    );
    tokio::spawn(event_handlers::route_node_events(
        Arc::clone(&music),
        node_events_rx,
    ));

    let lyrics = GeniusClient::new(config.genius_token.clone(), config.lyrics_timeout);
    if config.genius_token.is_none() {
        warn!("GENIUS_TOKEN is not set, lyrics lookups will fail");
    }

    let avatar_path = config.avatar_path.clone();
    let data_music = Arc::clone(&music);
    let framework = poise::Framework::builder()
        .options(lavabot::framework_options(&config.prefix))
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);

                if let Some(path) = avatar_path {
                    match CreateAttachment::path(&path).await {
                        Ok(avatar) => {
                            let mut user = ctx.cache.current_user().clone();
                            if let Err(e) = user.edit(ctx, EditProfile::new().avatar(&avatar)).await {
                                warn!("Failed to update avatar: {}", e);
                            }
                        }
                        Err(e) => warn!("Cannot read avatar {}: {}", path.display(), e),
                    }
                }

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    music: data_music,
                    lyrics,
                })
            })
        });

    let mut client = ClientBuilder::new(&config.discord_token, lavabot::intents())
        .framework(framework.build())
        .event_handler(Handler { music })
        .register_songbird_with(songbird)
        .await?;

    if let Err(e) = client.start().await {
        error!("Client stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
