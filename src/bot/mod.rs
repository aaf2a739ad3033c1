//! # Bot Module
//!
//! Discord glue for Open Jukebox.
//!
//! - [`commands`]: prefix/keyword parsing of chat messages
//! - [`handlers`]: the [`CommandRouter`] that validates preconditions and
//!   drives the [`QueueManager`]
//! - [`events`]: announcer task for playback notifications
//!
//! [`JukeboxBot`] implements Serenity's [`EventHandler`]: it turns gateway
//! messages into [`InboundMessage`]s, sends the router's reply back, and
//! resets a guild's session when the bot is forced out of voice.

use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Message, Ready, VoiceState},
    async_trait,
};
use songbird::Songbird;
use std::sync::Arc;
use tracing::{error, info};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{audio::player::QueueManager, error::BotError};
use events::AnnounceChannels;
use handlers::{CommandRouter, InboundMessage, VoiceGateway};

/// Main Discord event handler.
pub struct JukeboxBot {
    router: CommandRouter,
    player: Arc<QueueManager>,
    announce: Arc<AnnounceChannels>,
}

impl JukeboxBot {
    pub fn new(router: CommandRouter, player: Arc<QueueManager>, announce: Arc<AnnounceChannels>) -> Self {
        Self {
            router,
            player,
            announce,
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!("⌨️ Prefijo de comandos: {}", self.router.prefix());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignorar mensajes de bots (incluido el propio)
        if msg.author.bot {
            return;
        }

        let Some(guild_id) = msg.guild_id else {
            return;
        };

        // No mantener la referencia a la caché a través de un await
        let author_voice_channel = msg
            .guild(&ctx.cache)
            .and_then(|guild| guild.voice_states.get(&msg.author.id).and_then(|vs| vs.channel_id));

        let inbound = InboundMessage {
            guild_id,
            author_voice_channel,
            content: msg.content.clone(),
        };

        // Registrar el canal antes de despachar: play puede anunciar de inmediato
        if inbound.content.trim_start().starts_with(self.router.prefix()) {
            self.announce.remember(guild_id, msg.channel_id);
        }

        let Some(reply) = self.router.dispatch(&inbound).await else {
            return;
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            error!("Error al responder en guild {}: {:?}", guild_id, e);
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        // Detectar si el bot fue desconectado
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }

        if let Some(guild_id) = new.guild_id {
            info!("🔌 Bot desconectado en guild {}", guild_id);
            self.player.clear_and_stop(guild_id).await;
        }
    }
}

/// [`VoiceGateway`] sobre el manager de Songbird
pub struct SongbirdGateway {
    manager: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    async fn is_connected(&self, guild_id: GuildId) -> bool {
        match self.manager.get(guild_id) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        }
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), BotError> {
        self.manager.join(guild_id, channel_id).await.map_err(|e| {
            error!("Error al conectar al canal de voz en guild {}: {:?}", guild_id, e);
            BotError::Gateway(e.to_string())
        })?;
        Ok(())
    }

    async fn leave(&self, guild_id: GuildId) -> Result<(), BotError> {
        self.manager.remove(guild_id).await.map_err(|e| {
            error!("Error al desconectar en guild {}: {:?}", guild_id, e);
            BotError::Gateway(e.to_string())
        })
    }
}
