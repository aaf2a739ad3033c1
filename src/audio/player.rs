use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::{
    audio::{
        queue::{PlaybackSession, PlaybackState, QueuePeek, Track},
        transport::{AudioTransport, Completion, CompletionNotifier},
    },
    error::{BotError, BotResult},
};

/// Notifications produced outside of a command's request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    NowPlaying { guild_id: GuildId, title: String },
    QueueEmpty { guild_id: GuildId },
    TrackFailed { guild_id: GuildId, title: String, reason: String },
}

impl PlaybackEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            PlaybackEvent::NowPlaying { guild_id, .. }
            | PlaybackEvent::QueueEmpty { guild_id }
            | PlaybackEvent::TrackFailed { guild_id, .. } => *guild_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Playing,
    Idle,
}

/// Owns every guild's [`PlaybackSession`] and decides when the transport
/// starts the next track.
///
/// Operations on one guild are serialized by that session's mutex; guilds
/// never share state. Playback completions arrive as [`Completion`]
/// messages and are consumed by [`QueueManager::drive`].
pub struct QueueManager {
    sessions: DashMap<GuildId, Arc<Mutex<PlaybackSession>>>,
    transport: Arc<dyn AudioTransport>,
    completions: mpsc::UnboundedSender<Completion>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    next_play_id: AtomicU64,
}

impl QueueManager {
    pub fn new(
        transport: Arc<dyn AudioTransport>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Completion>) {
        let (completions, completions_rx) = mpsc::unbounded_channel();
        let manager = Arc::new(Self {
            sessions: DashMap::new(),
            transport,
            completions,
            events,
            next_play_id: AtomicU64::new(1),
        });
        (manager, completions_rx)
    }

    /// Consume las notificaciones de fin de pista hasta que se cierre el canal
    pub async fn drive(self: Arc<Self>, mut completions: mpsc::UnboundedReceiver<Completion>) {
        while let Some(completion) = completions.recv().await {
            self.handle_completion(completion).await;
        }
        debug!("Canal de completions cerrado");
    }

    /// Crea la sesión de la guild si todavía no existe
    pub fn open_session(&self, guild_id: GuildId) {
        self.session(guild_id);
    }

    /// Epoch actual de la sesión; cambia con cada `clear_and_stop`
    pub async fn epoch(&self, guild_id: GuildId) -> u64 {
        let session = self.session(guild_id);
        let epoch = session.lock().await.epoch();
        epoch
    }

    /// Appends `tracks` in order, unless the session was cleared since
    /// `epoch` was read. A disconnect that lands while a command is still
    /// resolving would otherwise leave its batch queued in a dead session.
    pub async fn enqueue(&self, guild_id: GuildId, epoch: u64, tracks: Vec<Track>) -> BotResult<usize> {
        let session = self.session(guild_id);
        let mut session = session.lock().await;
        if session.epoch() != epoch {
            info!("🗑️ Lote descartado: la sesión de guild {} se limpió durante la resolución", guild_id);
            return Err(BotError::ActiveVoiceRequired);
        }
        let count = session.enqueue(tracks);
        info!("➕ {} canciones agregadas en guild {} (pendientes: {})", count, guild_id, session.len());
        Ok(count)
    }

    /// Starts the head of the queue if nothing is playing.
    ///
    /// Returns `Ok(false)` when already playing or when the queue is empty.
    /// On a transport failure the dequeued track is dropped and the session
    /// is left `Idle`.
    pub async fn maybe_start(&self, guild_id: GuildId) -> Result<bool, BotError> {
        let session = self.session(guild_id);
        let mut session = session.lock().await;
        self.start_locked(guild_id, &mut session).await.map_err(|failure| failure.error)
    }

    /// Reacts to a transport report. Returns `None` for stale reports, i.e.
    /// those whose play id is no longer the in-flight one.
    pub async fn handle_completion(&self, completion: Completion) -> Option<AdvanceOutcome> {
        let Completion {
            guild_id,
            play_id,
            result,
        } = completion;

        let session = self.sessions.get(&guild_id).map(|s| s.clone())?;
        let mut session = session.lock().await;

        if session.in_flight() != Some(play_id) {
            debug!("Completion obsoleta ignorada (play {}) en guild {}", play_id, guild_id);
            return None;
        }

        if let Err(e) = result {
            let title = playing_title(&session);
            warn!("❌ Falló la reproducción de '{}' en guild {}: {}", title, guild_id, e);
            self.emit(PlaybackEvent::TrackFailed {
                guild_id,
                title,
                reason: e.detail(),
            });
        }

        Some(self.advance_locked(guild_id, &mut session).await)
    }

    /// Stops the current track and advances. Returns `false` when idle.
    pub async fn skip(&self, guild_id: GuildId) -> bool {
        let Some(session) = self.sessions.get(&guild_id).map(|s| s.clone()) else {
            return false;
        };
        let mut session = session.lock().await;

        if !session.is_playing() {
            return false;
        }

        info!("⏭️ Saltando '{}' en guild {}", playing_title(&session), guild_id);
        self.transport.stop(guild_id).await;
        // advance retira el play id actual: el evento de fin que llegue
        // después para la pista detenida queda obsoleto
        self.advance_locked(guild_id, &mut session).await;
        true
    }

    /// Empties the queue, forces `Idle` and stops the transport.
    pub async fn clear_and_stop(&self, guild_id: GuildId) {
        let session = self.session(guild_id);
        let mut session = session.lock().await;
        session.clear();
        self.transport.stop(guild_id).await;
        info!("⏹️ Reproducción detenida en guild {}", guild_id);
    }

    /// Enqueue against whatever epoch is current.
    #[cfg(test)]
    pub async fn enqueue_current(&self, guild_id: GuildId, tracks: Vec<Track>) -> usize {
        let epoch = self.epoch(guild_id).await;
        self.enqueue(guild_id, epoch, tracks).await.unwrap_or_default()
    }

    pub async fn peek(&self, guild_id: GuildId, limit: usize) -> QueuePeek {
        match self.sessions.get(&guild_id).map(|s| s.clone()) {
            Some(session) => session.lock().await.peek(limit),
            None => QueuePeek::default(),
        }
    }

    pub async fn is_playing(&self, guild_id: GuildId) -> bool {
        match self.sessions.get(&guild_id).map(|s| s.clone()) {
            Some(session) => session.lock().await.is_playing(),
            None => false,
        }
    }

    // Funciones privadas

    async fn advance_locked(&self, guild_id: GuildId, session: &mut PlaybackSession) -> AdvanceOutcome {
        session.set_idle();

        match self.start_locked(guild_id, session).await {
            Ok(true) => AdvanceOutcome::Playing,
            Ok(false) => {
                info!("📭 Cola vacía en guild {}", guild_id);
                self.emit(PlaybackEvent::QueueEmpty { guild_id });
                AdvanceOutcome::Idle
            }
            Err(StartFailure { title, error }) => {
                // Sin comando que responda: se avisa por el canal de eventos
                self.emit(PlaybackEvent::TrackFailed {
                    guild_id,
                    title,
                    reason: error.detail(),
                });
                AdvanceOutcome::Idle
            }
        }
    }

    async fn start_locked(&self, guild_id: GuildId, session: &mut PlaybackSession) -> Result<bool, StartFailure> {
        if session.is_playing() {
            return Ok(false);
        }

        let Some(track) = session.take_next() else {
            debug!("Cola vacía para guild {}", guild_id);
            return Ok(false);
        };

        let play_id = self.next_play_id.fetch_add(1, Ordering::Relaxed);
        session.begin(play_id, track.title());

        let notifier = CompletionNotifier::new(guild_id, play_id, self.completions.clone());
        match self.transport.start(guild_id, track.source_ref(), notifier).await {
            Ok(()) => {
                info!("🎵 Reproduciendo en guild {}: {}", guild_id, track.title());
                self.emit(PlaybackEvent::NowPlaying {
                    guild_id,
                    title: track.title().to_string(),
                });
                Ok(true)
            }
            Err(e) => {
                session.set_idle();
                warn!("❌ No se pudo iniciar '{}' en guild {}: {}", track.title(), guild_id, e);
                Err(StartFailure {
                    title: track.title().to_string(),
                    error: e,
                })
            }
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.events.send(event).is_err() {
            debug!("Sin receptor de eventos de reproducción");
        }
    }

    fn session(&self, guild_id: GuildId) -> Arc<Mutex<PlaybackSession>> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(PlaybackSession::new())))
            .clone()
    }
}

struct StartFailure {
    title: String,
    error: BotError,
}

fn playing_title(session: &PlaybackSession) -> String {
    match session.state() {
        PlaybackState::Playing { title, .. } => title.clone(),
        PlaybackState::Idle => String::new(),
    }
}
