// Player collaborator interface.
//
// The session drives playback only through this trait, so tests can swap in
// a fake and the real implementation (mpv.rs) stays a thin process wrapper.

use async_trait::async_trait;

use crate::error::PlayerError;
use crate::youtube::search::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,     // Nothing loaded
    Cued,     // Track loaded but never started
    Buffering,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "⏹ Stopped",
            PlaybackState::Cued => "⏏ Cued",
            PlaybackState::Buffering => "… Buffering",
            PlaybackState::Playing => "▶ Playing",
            PlaybackState::Paused => "⏸ Paused",
            PlaybackState::Ended => "⏹ Ended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The track started by `play` call number `generation` ran to its end.
    Ended { generation: u64 },
}

#[async_trait]
pub trait PlayerBackend: Send {
    /// Starts `item` from the beginning, replacing whatever was playing.
    async fn play(&mut self, item: &SearchResult) -> Result<(), PlayerError>;

    /// Loads `item` without starting it.
    async fn cue(&mut self, item: &SearchResult) -> Result<(), PlayerError>;

    async fn pause(&mut self) -> Result<(), PlayerError>;

    /// Continues a paused track, or starts a cued one.
    async fn resume(&mut self) -> Result<(), PlayerError>;

    /// Stops playback. Never emits `Ended`.
    async fn stop(&mut self);

    fn state(&self) -> PlaybackState;

    /// Bumped by every `play`; `Ended` events carry the value they belong to.
    fn generation(&self) -> u64;

    fn loaded(&self) -> Option<&SearchResult>;
}
