use dashmap::DashMap;
use serenity::{
    http::Http,
    model::id::{ChannelId, GuildId},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::{audio::player::PlaybackEvent, ui::messages};

/// Último canal de texto desde el que cada guild envió un comando
#[derive(Debug, Default)]
pub struct AnnounceChannels {
    channels: DashMap<GuildId, ChannelId>,
}

impl AnnounceChannels {
    pub fn remember(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.channels.insert(guild_id, channel_id);
    }

    pub fn target(&self, event: &PlaybackEvent) -> Option<ChannelId> {
        self.channels.get(&event.guild_id()).map(|c| *c)
    }
}

/// Publica en el chat los eventos de reproducción hasta que se cierre el canal
pub async fn announce_playback_events(
    http: Arc<Http>,
    channels: Arc<AnnounceChannels>,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(channel_id) = channels.target(&event) else {
            debug!("Sin canal de anuncios para guild {}", event.guild_id());
            continue;
        };

        if let Err(e) = channel_id.say(&http, messages::playback_event(&event)).await {
            error!("Error al enviar anuncio en guild {}: {:?}", event.guild_id(), e);
        }
    }
}
