//! Spotify playback source
//!
//! Web API client for the currently-playing endpoint, OAuth token
//! lifecycle, and the fixed-interval poller that turns playback snapshots
//! into session events.

pub mod api;
pub mod auth;
pub mod poller;

pub use api::SpotifyClient;

use std::future::Future;

/// One fresh immutable snapshot per poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub track_id: String,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub track_name: String,
    /// All artists joined for display ("A, B").
    pub artist_name: String,
    /// First listed artist; source queries use this one, since cascades
    /// rarely index tracks under a comma-joined artist list.
    pub primary_artist: String,
    /// Smallest album image, if the provider reported any.
    pub artwork_url: Option<String>,
}

/// Anything that can report the current playback session.
///
/// `Ok(None)` is "no active session"; `Err` is a transport failure the
/// caller logs and ignores.
pub trait PlaybackSource {
    fn current_playback(
        &self,
    ) -> impl Future<Output = anyhow::Result<Option<PlaybackState>>> + Send;
}
