use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod error;
mod health;
mod sources;
mod ui;

use crate::audio::{player::QueueManager, transport::SongbirdTransport};
use crate::bot::{
    events::{announce_playback_events, AnnounceChannels},
    handlers::CommandRouter,
    JukeboxBot, SongbirdGateway,
};
use crate::config::Config;
use crate::sources::YtDlpResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Open Jukebox v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health::health_check(&config).await;
    }

    let shutdown = CancellationToken::new();

    // Endpoint de liveness para el hosting
    if config.liveness_enabled {
        let addr = config.liveness_addr;
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr, token).await {
                error!("❌ Error en el endpoint de liveness: {:?}", e);
            }
        });
    }

    // Cola y transporte de audio
    let songbird = Songbird::serenity();
    // Songbird exige un programa 'static; vive lo mismo que el proceso
    let ytdlp: &'static str = Box::leak(config.ytdlp_path.clone().into_boxed_str());
    let transport = Arc::new(SongbirdTransport::new(songbird.clone(), ytdlp));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (player, completions) = QueueManager::new(transport, events_tx);
    tokio::spawn(player.clone().drive(completions));

    let resolver = Arc::new(YtDlpResolver::new(&config));
    if let Err(e) = resolver.verify().await {
        warn!("⚠️ yt-dlp no disponible, play fallará hasta instalarlo: {:?}", e);
    }

    let router = CommandRouter::new(
        config.command_prefix.clone(),
        config.queue_preview_len,
        player.clone(),
        resolver,
        Arc::new(SongbirdGateway::new(songbird.clone())),
    );
    let announce = Arc::new(AnnounceChannels::default());
    let handler = JukeboxBot::new(router, player, announce.clone());

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    tokio::spawn(announce_playback_events(client.http.clone(), announce, events_rx));

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        token.cancel();
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    shutdown.cancel();
    Ok(())
}
