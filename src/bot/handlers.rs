use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    audio::player::QueueManager,
    bot::commands::Command,
    error::{BotError, BotResult},
    sources::MediaResolver,
    ui::messages,
};

/// Conexiones de voz del gateway de chat, por guild
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn is_connected(&self, guild_id: GuildId) -> bool;

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> BotResult<()>;

    async fn leave(&self, guild_id: GuildId) -> BotResult<()>;
}

/// Inbound chat event, already stripped of gateway specifics.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub guild_id: GuildId,
    pub author_voice_channel: Option<ChannelId>,
    pub content: String,
}

/// Classifies commands, checks their preconditions and drives the
/// [`QueueManager`]. Every recognized command produces exactly one reply.
pub struct CommandRouter {
    prefix: String,
    preview_len: usize,
    player: Arc<QueueManager>,
    resolver: Arc<dyn MediaResolver>,
    voice: Arc<dyn VoiceGateway>,
}

impl CommandRouter {
    pub fn new(
        prefix: impl Into<String>,
        preview_len: usize,
        player: Arc<QueueManager>,
        resolver: Arc<dyn MediaResolver>,
        voice: Arc<dyn VoiceGateway>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            preview_len,
            player,
            resolver,
            voice,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Devuelve la respuesta para el chat, o `None` si no es un comando
    pub async fn dispatch(&self, message: &InboundMessage) -> Option<String> {
        let command = Command::parse(&self.prefix, &message.content)?;

        info!("📝 Comando {}{} en guild {}", self.prefix, command.name(), message.guild_id);

        let reply = match self.execute(command, message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Comando fallido en guild {}: {}", message.guild_id, e);
                messages::error_text(&e, &self.prefix)
            }
        };

        Some(reply)
    }

    async fn execute(&self, command: Command, message: &InboundMessage) -> BotResult<String> {
        let guild_id = message.guild_id;

        match command {
            Command::Join => self.handle_join(guild_id, message.author_voice_channel).await,
            Command::Play(argument) => {
                self.handle_play(guild_id, message.author_voice_channel, &argument)
                    .await
            }
            Command::Queue => {
                let peek = self.player.peek(guild_id, self.preview_len).await;
                Ok(messages::queue_listing(&peek))
            }
            Command::Skip => Ok(messages::skipped(self.player.skip(guild_id).await)),
            Command::Leave => self.handle_leave(guild_id).await,
            Command::Help => Ok(messages::help(&self.prefix)),
        }
    }

    async fn handle_join(&self, guild_id: GuildId, author_channel: Option<ChannelId>) -> BotResult<String> {
        let channel_id = author_channel.ok_or(BotError::NoUserVoiceChannel)?;

        if self.voice.is_connected(guild_id).await {
            return Err(BotError::AlreadyConnected);
        }

        self.voice.join(guild_id, channel_id).await?;
        self.player.open_session(guild_id);

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
        Ok(messages::connected(&format!("<#{channel_id}>")))
    }

    async fn handle_play(
        &self,
        guild_id: GuildId,
        author_channel: Option<ChannelId>,
        argument: &str,
    ) -> BotResult<String> {
        author_channel.ok_or(BotError::NoUserVoiceChannel)?;

        // Leído antes de comprobar la conexión: un leave posterior lo invalida
        let epoch = self.player.epoch(guild_id).await;
        if !self.voice.is_connected(guild_id).await {
            return Err(BotError::ActiveVoiceRequired);
        }

        if argument.is_empty() {
            return Err(BotError::MissingUrl);
        }

        // La resolución corre fuera del lock de la sesión
        let batch = self.resolver.resolve(argument).await?.into_batch()?;
        let reply = messages::added(&batch);

        self.player.enqueue(guild_id, epoch, batch.tracks).await?;

        match self.player.maybe_start(guild_id).await {
            Ok(_) => Ok(reply),
            Err(e) => Ok(format!("{reply}\n{}", messages::error_text(&e, &self.prefix))),
        }
    }

    async fn handle_leave(&self, guild_id: GuildId) -> BotResult<String> {
        if !self.voice.is_connected(guild_id).await {
            return Err(BotError::NotConnected);
        }

        self.player.clear_and_stop(guild_id).await;
        self.voice.leave(guild_id).await?;

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        Ok(messages::left())
    }
}
