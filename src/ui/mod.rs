//! Texto que el bot envía al chat.

pub mod messages;
