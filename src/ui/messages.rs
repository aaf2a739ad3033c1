use std::fmt::Write;

use crate::{
    audio::{player::PlaybackEvent, queue::QueuePeek},
    error::BotError,
    sources::{BatchKind, ResolvedBatch},
};

/// Texto único que ve el usuario para cada error de comando
pub fn error_text(error: &BotError, prefix: &str) -> String {
    match error {
        BotError::NoUserVoiceChannel => "❌ ¡Debes estar en un canal de voz para usar este comando!".to_string(),
        BotError::AlreadyConnected => "⚠️ Ya estoy en un canal de voz.".to_string(),
        BotError::ActiveVoiceRequired => {
            format!("❌ No estoy conectado a un canal de voz. Usa `{prefix}join` primero.")
        }
        BotError::MissingUrl => format!("❌ Proporciona una URL después del comando `{prefix}play`."),
        BotError::NotConnected => "❌ No estoy en un canal de voz.".to_string(),
        BotError::Resolution(reason) => format!("❌ Ocurrió un error al procesar el enlace: {reason}"),
        BotError::Transport(reason) => format!("❌ Ocurrió un error al intentar reproducir la canción: {reason}"),
        BotError::Gateway(_) => "❌ Ocurrió un error inesperado. Inténtalo de nuevo.".to_string(),
    }
}

pub fn connected(channel_mention: &str) -> String {
    format!("✅ Conectado a {channel_mention}")
}

pub fn added(batch: &ResolvedBatch) -> String {
    match batch.kind {
        BatchKind::Single => {
            let title = batch.tracks.first().map(|t| t.title()).unwrap_or_default();
            format!("🎵 Agregado a la cola: **{title}**")
        }
        BatchKind::Playlist => {
            let mut text = format!(
                "🎵 ¡Playlist agregada! **{}** canciones fueron agregadas a la cola.",
                batch.tracks.len()
            );
            if batch.dropped > 0 {
                let _ = write!(text, " ({} no disponibles omitidas)", batch.dropped);
            }
            text
        }
    }
}

/// Lista de próximas canciones; la cola vacía tiene su propio mensaje
pub fn queue_listing(peek: &QueuePeek) -> String {
    if peek.is_empty() {
        return "📭 La cola de música está vacía.".to_string();
    }

    let mut listing = String::from("**Próximas canciones en la cola:**\n```\n");
    for (i, track) in peek.tracks.iter().enumerate() {
        let _ = writeln!(listing, "{}. {}", i + 1, track.title());
    }
    if peek.remaining > 0 {
        let _ = writeln!(listing, "\n... y {} canción(es) más.", peek.remaining);
    }
    listing.push_str("```");
    listing
}

pub fn skipped(skipped: bool) -> String {
    if skipped {
        "⏭️ ¡Canción saltada!".to_string()
    } else {
        "❌ No hay ninguna canción reproduciéndose para saltar.".to_string()
    }
}

pub fn left() -> String {
    "👋 Desconectado del canal de voz y cola limpiada.".to_string()
}

pub fn playback_event(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::NowPlaying { title, .. } => format!("🎶 Reproduciendo ahora: **{title}**"),
        PlaybackEvent::QueueEmpty { .. } => "📭 Cola de música vacía.".to_string(),
        PlaybackEvent::TrackFailed { title, reason, .. } => {
            format!("❌ Error al reproducir **{title}**: {reason}")
        }
    }
}

pub fn help(prefix: &str) -> String {
    format!(
        "```\n\
📜 LISTA DE COMANDOS 📜\n\
\n\
{p}join (o {p}dentro)\n    » Entra en tu canal de voz.\n\
\n\
{p}play <URL o búsqueda>\n    » Agrega una canción o playlist a la cola.\n\
\n\
{p}queue (o {p}fila)\n    » Muestra las próximas canciones.\n\
\n\
{p}skip (o {p}pular)\n    » Salta a la siguiente canción.\n\
\n\
{p}leave (o {p}tchau)\n    » Sale del canal de voz y limpia la cola.\n\
\n\
{p}help (o {p}ajuda)\n    » Muestra este mensaje.\n\
```",
        p = prefix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::queue::Track;

    fn peek_of(count: usize, remaining: usize) -> QueuePeek {
        QueuePeek {
            tracks: (1..=count).map(|i| Track::new(format!("u{i}"), format!("Song {i}"))).collect(),
            remaining,
        }
    }

    #[test]
    fn test_empty_queue_has_distinct_message() {
        let text = queue_listing(&QueuePeek::default());
        assert!(text.contains("vacía"));
        assert!(!text.contains("```"));
    }

    #[test]
    fn test_listing_numbers_entries_and_remainder() {
        let text = queue_listing(&peek_of(10, 2));
        assert!(text.contains("1. Song 1\n"));
        assert!(text.contains("10. Song 10\n"));
        assert!(text.contains("... y 2 canción(es) más."));
        assert!(text.ends_with("```"));
    }

    #[test]
    fn test_listing_without_remainder() {
        let text = queue_listing(&peek_of(3, 0));
        assert!(!text.contains("más"));
    }

    #[test]
    fn test_playlist_reply_reports_dropped() {
        let batch = ResolvedBatch {
            kind: BatchKind::Playlist,
            tracks: vec![Track::new("a", "A"), Track::new("b", "B"), Track::new("c", "C")],
            dropped: 2,
        };
        let text = added(&batch);
        assert!(text.contains("**3**"));
        assert!(text.contains("2 no disponibles"));
    }

    #[test]
    fn test_error_texts_use_prefix() {
        assert!(error_text(&BotError::ActiveVoiceRequired, "!").contains("`!join`"));
        assert!(error_text(&BotError::MissingUrl, "#").contains("`#play`"));
        assert!(!error_text(&BotError::Gateway("socket closed".into()), "#").contains("socket"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let text = help("#");
        for keyword in ["#join", "#play", "#queue", "#skip", "#leave", "#help"] {
            assert!(text.contains(keyword), "missing {keyword}");
        }
    }
}
