use crate::lyrics::Transcript;
use crate::spotify::PlaybackState;
use crate::theme::ThemeColors;

/// Everything the session coordinator consumes, on one channel so state
/// transitions stay serialized.
#[derive(Debug)]
pub enum Event {
    Playback(PlaybackEvent),
    Lyrics(LyricsEvent),
    Theme(ThemeEvent),
}

#[derive(Debug)]
pub enum PlaybackEvent {
    Updated(PlaybackState),
    /// Edge-triggered: emitted once per entry into the no-playback
    /// condition.
    NoPlayback,
}

/// Completion of a per-track resolver task, tagged so stale results can
/// be discarded.
#[derive(Debug)]
pub enum LyricsEvent {
    Resolved {
        track_id: String,
        /// `None` means every source was exhausted.
        transcript: Option<Transcript>,
    },
}

#[derive(Debug)]
pub enum ThemeEvent {
    Derived {
        track_id: String,
        colors: ThemeColors,
    },
}

/// Display-ready events for the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Display {
        current: String,
        next: String,
        progress_ms: u64,
        duration_ms: u64,
        is_playing: bool,
    },
    Status(String),
    Theme(ThemeColors),
}
