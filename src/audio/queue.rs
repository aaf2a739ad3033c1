use std::collections::VecDeque;
use tracing::{debug, info};

/// Identificador de una reproducción concreta dentro de un proceso.
///
/// Cada arranque de pista recibe uno nuevo; las notificaciones de fin que
/// no coinciden con el de la sesión se consideran obsoletas.
pub type PlayId = u64;

/// One playable unit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    source_ref: String,
    title: String,
}

impl Track {
    pub fn new(source_ref: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            title: title.into(),
        }
    }

    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// Exactly one track is in flight; it is no longer part of the queue.
    Playing { play_id: PlayId, title: String },
}

/// Queue and playback state for a single guild.
///
/// Pure data: the [`QueueManager`](super::player::QueueManager) owns one per
/// guild behind a mutex and is the only component that mutates it.
#[derive(Debug)]
pub struct PlaybackSession {
    queue: VecDeque<Track>,
    state: PlaybackState,
    /// Changes on every clear; batches resolved against an older epoch are
    /// rejected.
    epoch: u64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            state: PlaybackState::Idle,
            epoch: 0,
        }
    }

    /// Agrega tracks al final de la cola respetando el orden recibido
    pub fn enqueue(&mut self, tracks: Vec<Track>) -> usize {
        let count = tracks.len();
        for track in tracks {
            debug!("➕ Agregado a la cola: {}", track.title());
            self.queue.push_back(track);
        }
        count
    }

    /// Saca el siguiente track (FIFO estricto)
    pub fn take_next(&mut self) -> Option<Track> {
        self.queue.pop_front()
    }

    pub fn begin(&mut self, play_id: PlayId, title: impl Into<String>) {
        self.state = PlaybackState::Playing {
            play_id,
            title: title.into(),
        };
    }

    pub fn set_idle(&mut self) {
        self.state = PlaybackState::Idle;
    }

    /// Limpia la cola y fuerza el estado Idle
    pub fn clear(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();
        self.state = PlaybackState::Idle;
        self.epoch = self.epoch.wrapping_add(1);
        info!("🗑️ Cola limpiada ({} pendientes descartadas)", dropped);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    pub fn in_flight(&self) -> Option<PlayId> {
        match self.state {
            PlaybackState::Playing { play_id, .. } => Some(play_id),
            PlaybackState::Idle => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Copia de los primeros `limit` tracks pendientes más el número restante
    pub fn peek(&self, limit: usize) -> QueuePeek {
        let tracks: Vec<Track> = self.queue.iter().take(limit).cloned().collect();
        let remaining = self.queue.len() - tracks.len();
        QueuePeek { tracks, remaining }
    }
}

/// Read-only view of the head of a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuePeek {
    pub tracks: Vec<Track>,
    pub remaining: usize,
}

impl QueuePeek {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.remaining == 0
    }
}
