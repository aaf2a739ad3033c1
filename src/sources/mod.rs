pub mod youtube;

use async_trait::async_trait;
use tracing::debug;

use crate::{audio::queue::Track, error::BotError};

pub use youtube::YtDlpResolver;

/// Convierte una referencia del usuario en uno o más items reproducibles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resuelve una URL (o búsqueda) sin reintentos
    async fn resolve(&self, query: &str) -> Result<Resolved, BotError>;
}

/// Raw item as reported by the resolver; either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub locator: Option<String>,
    pub title: Option<String>,
}

impl Candidate {
    #[cfg(test)]
    pub fn new(locator: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            locator: Some(locator.into()),
            title: Some(title.into()),
        }
    }

    /// Solo produce un Track si hay locator y título no vacíos
    pub fn into_track(self) -> Option<Track> {
        let locator = self.locator.filter(|l| !l.trim().is_empty())?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        Some(Track::new(locator, title))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Single(Candidate),
    /// Entries in resolver order; `None` for entries the resolver could not
    /// extract at all.
    Playlist(Vec<Option<Candidate>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Single,
    Playlist,
}

/// Tracks ready for enqueueing, plus how many playlist entries were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBatch {
    pub kind: BatchKind,
    pub tracks: Vec<Track>,
    pub dropped: usize,
}

impl Resolved {
    /// Validates candidates into tracks.
    ///
    /// A single item must be complete. Playlist entries missing a locator or a
    /// title are dropped, keeping the relative order of the rest. A playlist
    /// with nothing playable yields an empty batch, not an error.
    pub fn into_batch(self) -> Result<ResolvedBatch, BotError> {
        match self {
            Resolved::Single(candidate) => {
                let track = candidate
                    .into_track()
                    .ok_or_else(|| BotError::Resolution("el resultado no tiene URL o título".into()))?;
                Ok(ResolvedBatch {
                    kind: BatchKind::Single,
                    tracks: vec![track],
                    dropped: 0,
                })
            }
            Resolved::Playlist(entries) => {
                let total = entries.len();
                let tracks: Vec<Track> = entries
                    .into_iter()
                    .flatten()
                    .filter_map(Candidate::into_track)
                    .collect();
                let dropped = total - tracks.len();

                if dropped > 0 {
                    debug!("🗑️ Playlist: {} de {} entradas descartadas", dropped, total);
                }

                Ok(ResolvedBatch {
                    kind: BatchKind::Playlist,
                    tracks,
                    dropped,
                })
            }
        }
    }
}
