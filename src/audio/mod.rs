//! # Audio Module
//!
//! Playback sequencing for Open Jukebox.
//!
//! ### [`queue`] - Session data
//! - [`Track`](queue::Track): one playable unit (source reference + title)
//! - [`PlaybackSession`](queue::PlaybackSession): FIFO queue plus the
//!   `Idle`/`Playing` state of one guild
//!
//! ### [`player`] - Queue Manager
//! - Per-guild session registry with mutual exclusion per session
//! - Sole authority over when the transport starts the next track
//! - Exactly-once advance on natural end, error or skip
//!
//! ### [`transport`] - Audio Transport
//! - [`AudioTransport`](transport::AudioTransport) seam and its Songbird
//!   implementation
//! - One-shot completion notifiers that feed back into the queue manager
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! # async fn example(manager: std::sync::Arc<crate::audio::player::QueueManager>) {
//! use crate::audio::queue::Track;
//! use serenity::all::GuildId;
//!
//! let guild_id = GuildId::new(123456789);
//! let epoch = manager.epoch(guild_id).await;
//! manager.enqueue(guild_id, epoch, vec![Track::new("https://youtu.be/dQw4w9WgXcQ", "Song")]).await;
//! let _started = manager.maybe_start(guild_id).await;
//! # }
//! ```

pub mod player;
pub mod queue;
pub mod transport;
