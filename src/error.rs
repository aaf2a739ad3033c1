//! Error taxonomy for command handling.
//!
//! Every variant is terminal to the command invocation that produced it and
//! is rendered to exactly one chat message by [`crate::ui::messages::error_text`].
//! Running out of tracks is not an error; see
//! [`PlaybackEvent::QueueEmpty`](crate::audio::player::PlaybackEvent::QueueEmpty).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// The invoking user is not in a voice channel
    #[error("user is not in a voice channel")]
    NoUserVoiceChannel,

    /// The bot already holds a voice connection in this guild
    #[error("already connected to a voice channel")]
    AlreadyConnected,

    /// The command needs an active voice connection
    #[error("an active voice connection is required")]
    ActiveVoiceRequired,

    /// play without argument
    #[error("missing URL argument")]
    MissingUrl,

    /// leave without an active voice connection
    #[error("not connected to a voice channel")]
    NotConnected,

    /// The media resolver could not produce playable items
    #[error("resolution error: {0}")]
    Resolution(String),

    /// The audio transport could not start a track
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected failure of the chat gateway (join, leave, ...)
    #[error("gateway error: {0}")]
    Gateway(String),
}

impl BotError {
    /// Collaborator-supplied reason, without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            BotError::Resolution(reason) | BotError::Transport(reason) | BotError::Gateway(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

pub type BotResult<T> = std::result::Result<T, BotError>;
