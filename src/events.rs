use serenity::all::VoiceState;
use serenity::async_trait;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::music::utils::music_manager::MusicManager;

/// Gateway events the music player reacts to outside of commands.
pub struct Handler {
    pub music: Arc<MusicManager>,
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        // Only the bot's own voice state matters here
        if new.user_id != ctx.cache.current_user().id || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        if self.music.has_session(guild_id) {
            info!("Removed from voice in guild {}, tearing down session", guild_id);
            if let Err(e) = self.music.teardown(guild_id).await {
                warn!("Teardown after voice removal failed in guild {}: {}", guild_id, e);
            }
        }
    }
}
