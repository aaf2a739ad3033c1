use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use songbird::{
    input::{Input, YoutubeDl},
    tracks::TrackHandle,
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{audio::queue::PlayId, error::BotError};

/// Terminal report for one playback, sent back into the queue manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub guild_id: GuildId,
    pub play_id: PlayId,
    pub result: Result<(), BotError>,
}

/// One-shot handle the transport uses to report that a playback ended.
///
/// Clones share the same latch: whichever clone fires first wins and every
/// later call is ignored, so a track that both errors and ends still yields
/// a single [`Completion`].
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    guild_id: GuildId,
    play_id: PlayId,
    fired: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionNotifier {
    pub fn new(guild_id: GuildId, play_id: PlayId, tx: mpsc::UnboundedSender<Completion>) -> Self {
        Self {
            guild_id,
            play_id,
            fired: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    pub fn play_id(&self) -> PlayId {
        self.play_id
    }

    /// Returns `true` only for the call that actually delivered the report.
    pub fn notify(&self, result: Result<(), BotError>) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.tx
            .send(Completion {
                guild_id: self.guild_id,
                play_id: self.play_id,
                result,
            })
            .is_ok()
    }
}

/// Streams a resolved locator into the guild's voice connection.
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Starts playback. `done` must be fired once the track ends or fails
    /// after a successful start; it is dropped unused when this returns `Err`.
    async fn start(&self, guild_id: GuildId, locator: &str, done: CompletionNotifier) -> Result<(), BotError>;

    /// Stops whatever is playing. Idempotent.
    async fn stop(&self, guild_id: GuildId);
}

/// Transporte sobre las conexiones de voz de Songbird
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    /// Ejecutable compatible con yt-dlp para extraer el stream
    ytdlp: &'static str,
    current_tracks: DashMap<GuildId, TrackHandle>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, ytdlp: &'static str) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            ytdlp,
            current_tracks: DashMap::new(),
        }
    }
}

#[async_trait]
impl AudioTransport for SongbirdTransport {
    async fn start(&self, guild_id: GuildId, locator: &str, done: CompletionNotifier) -> Result<(), BotError> {
        let call = self
            .manager
            .get(guild_id)
            .ok_or_else(|| BotError::Transport("no hay conexión de voz activa".into()))?;

        // YoutubeDl resuelve la URL de stream de forma perezosa al reproducir
        let input: Input = YoutubeDl::new_ytdl_like(self.ytdlp, self.http.clone(), locator.to_string()).into();

        let track_handle = {
            let mut handler_lock = call.lock().await;
            if handler_lock.current_channel().is_none() {
                return Err(BotError::Transport("conexión de voz perdida".into()));
            }
            handler_lock.play_input(input)
        };

        for (event, failed) in [(TrackEvent::End, false), (TrackEvent::Error, true)] {
            track_handle
                .add_event(
                    Event::Track(event),
                    TrackDoneHandler {
                        notifier: done.clone(),
                        failed,
                    },
                )
                .map_err(|e| BotError::Transport(format!("error al registrar evento: {e}")))?;
        }

        info!("▶️ Stream iniciado en guild {}: {}", guild_id, locator);
        self.current_tracks.insert(guild_id, track_handle);
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) {
        if let Some((_, track)) = self.current_tracks.remove(&guild_id) {
            // Si la pista ya terminó, stop devuelve error y no hay nada que hacer
            if let Err(e) = track.stop() {
                debug!("Track ya detenido en guild {}: {:?}", guild_id, e);
            }
        }
    }
}

/// Traduce los eventos de fin/error de Songbird a una única notificación
struct TrackDoneHandler {
    notifier: CompletionNotifier,
    failed: bool,
}

#[async_trait]
impl VoiceEventHandler for TrackDoneHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let result = if self.failed {
            let reason = match ctx {
                EventContext::Track(tracks) => tracks
                    .first()
                    .map(|(state, _)| format!("{:?}", state.playing))
                    .unwrap_or_else(|| "error desconocido".to_string()),
                _ => "error desconocido".to_string(),
            };
            warn!("❌ Error de reproducción (play {}): {}", self.notifier.play_id(), reason);
            Err(BotError::Transport(reason))
        } else {
            Ok(())
        };

        self.notifier.notify(result);
        None
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording transport used by the queue manager and router tests.

    use super::*;
    use std::sync::{atomic::AtomicUsize, Mutex};

    #[derive(Default)]
    pub struct FakeTransport {
        started: Mutex<Vec<(GuildId, String, CompletionNotifier)>>,
        stops: AtomicUsize,
        fail_next: AtomicBool,
    }

    impl FakeTransport {
        pub fn fail_next_start(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        pub fn started_locators(&self) -> Vec<String> {
            self.started.lock().unwrap().iter().map(|(_, l, _)| l.clone()).collect()
        }

        pub fn start_count(&self) -> usize {
            self.started.lock().unwrap().len()
        }

        /// Notifier handed over by the most recent successful start.
        pub fn last_notifier(&self) -> CompletionNotifier {
            self.started.lock().unwrap().last().map(|(_, _, n)| n.clone()).expect("no playback started")
        }

        /// Notifier of the `index`-th successful start, if it happened yet.
        pub fn notifier(&self, index: usize) -> Option<CompletionNotifier> {
            self.started.lock().unwrap().get(index).map(|(_, _, n)| n.clone())
        }

        pub fn stop_count(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioTransport for FakeTransport {
        async fn start(&self, guild_id: GuildId, locator: &str, done: CompletionNotifier) -> Result<(), BotError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(BotError::Transport("connection lost".into()));
            }
            self.started.lock().unwrap().push((guild_id, locator.to_string(), done));
            Ok(())
        }

        async fn stop(&self, _guild_id: GuildId) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_fires_once_across_clones() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = CompletionNotifier::new(GuildId::new(1), 4, tx);
        let end = notifier.clone();

        assert!(notifier.notify(Err(BotError::Transport("decode".into()))));
        assert!(!end.notify(Ok(())));

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.play_id, 4);
        assert!(completion.result.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_songbird_transport_uses_configured_ytdlp() {
        let transport = SongbirdTransport::new(Songbird::serenity(), "/opt/tools/yt-dlp");
        assert_eq!(transport.ytdlp, "/opt/tools/yt-dlp");

        // Sin conexión de voz no hay nada que reproducir
        let (tx, _rx) = mpsc::unbounded_channel();
        let notifier = CompletionNotifier::new(GuildId::new(1), 1, tx);
        let result = transport.start(GuildId::new(1), "https://youtu.be/x", notifier).await;
        assert!(matches!(result, Err(BotError::Transport(_))));
    }
}
