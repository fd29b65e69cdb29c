//! Session coordinator
//!
//! Owns the current track identity and cached transcript. All events pass
//! through `handle_event` on one consumer, so no transition ever runs
//! concurrently with another. Lyric and theme fetches are spawned per
//! track, tagged with the track id, and their completions are discarded
//! when the tag no longer matches.

use crate::app::events::{Event, LyricsEvent, PlaybackEvent, ThemeEvent, UiEvent};
use crate::lyrics::{self, LyricsSource, Transcript};
use crate::spotify::PlaybackState;
use crate::theme::{self, ThemeParams};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const NOT_FOUND_TEXT: &str = "Lyrics not found.";
pub const SEARCHING_STATUS: &str = "Searching for lyrics...";
pub const NO_PLAYBACK_STATUS: &str = "Nothing playing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ResolvingLyrics,
    Synced,
}

#[derive(Debug, Clone)]
pub struct SessionParams {
    pub source_timeout: Duration,
    pub theme: ThemeParams,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(10),
            theme: ThemeParams::default(),
        }
    }
}

pub struct Session<S> {
    sources: Arc<Vec<S>>,
    http: reqwest::Client,
    params: SessionParams,
    ui_tx: mpsc::Sender<UiEvent>,
    state: SessionState,
    current_track_id: Option<String>,
    current_artwork: Option<String>,
    transcript: Option<Transcript>,
}

impl<S> Session<S>
where
    S: LyricsSource + Send + Sync + 'static,
{
    pub fn new(
        sources: Vec<S>,
        http: reqwest::Client,
        params: SessionParams,
        ui_tx: mpsc::Sender<UiEvent>,
    ) -> Self {
        Self {
            sources: Arc::new(sources),
            http,
            params,
            ui_tx,
            state: SessionState::Idle,
            current_track_id: None,
            current_artwork: None,
            transcript: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track_id.as_deref()
    }

    pub async fn handle_event(&mut self, event: Event, tx: &mpsc::Sender<Event>) {
        match event {
            Event::Playback(PlaybackEvent::Updated(state)) => {
                self.on_playback_updated(state, tx).await;
            }
            Event::Playback(PlaybackEvent::NoPlayback) => {
                self.on_no_playback().await;
            }
            Event::Lyrics(LyricsEvent::Resolved {
                track_id,
                transcript,
            }) => {
                self.on_lyrics_resolved(track_id, transcript, tx).await;
            }
            Event::Theme(ThemeEvent::Derived { track_id, colors }) => {
                if self.current_track_id.as_deref() == Some(track_id.as_str()) {
                    self.emit(UiEvent::Theme(colors)).await;
                } else {
                    tracing::debug!(%track_id, "discarding stale theme result");
                }
            }
        }
    }

    async fn on_playback_updated(&mut self, state: PlaybackState, tx: &mpsc::Sender<Event>) {
        let changed = self.current_track_id.as_deref() != Some(state.track_id.as_str());
        if changed {
            self.start_resolving(state, tx).await;
            return;
        }

        if self.state == SessionState::Synced
            && let Some(transcript) = &self.transcript
        {
            let r = lyrics::sync_at(transcript, state.progress_ms);
            self.emit(UiEvent::Display {
                current: r.current,
                next: r.next,
                progress_ms: state.progress_ms,
                duration_ms: state.duration_ms,
                is_playing: state.is_playing,
            })
            .await;
        }
    }

    async fn start_resolving(&mut self, state: PlaybackState, tx: &mpsc::Sender<Event>) {
        tracing::info!(
            track = %state.track_name,
            artist = %state.artist_name,
            "track changed"
        );
        self.state = SessionState::ResolvingLyrics;
        self.current_track_id = Some(state.track_id.clone());
        self.current_artwork = state.artwork_url.clone();
        self.transcript = None;

        self.emit(UiEvent::Status(SEARCHING_STATUS.to_string())).await;
        // Neutral theme right away; the artwork theme lands later.
        self.emit(UiEvent::Theme(theme::NEUTRAL)).await;

        let sources = self.sources.clone();
        let timeout = self.params.source_timeout;
        let tx = tx.clone();
        tokio::spawn(async move {
            let transcript = lyrics::resolve(
                &sources,
                &state.track_name,
                &state.primary_artist,
                state.duration_ms,
                timeout,
            )
            .await;
            let _ = tx
                .send(Event::Lyrics(LyricsEvent::Resolved {
                    track_id: state.track_id,
                    transcript,
                }))
                .await;
        });
    }

    async fn on_lyrics_resolved(
        &mut self,
        track_id: String,
        transcript: Option<Transcript>,
        tx: &mpsc::Sender<Event>,
    ) {
        if self.current_track_id.as_deref() != Some(track_id.as_str()) {
            tracing::debug!(%track_id, "discarding stale lyrics result");
            return;
        }

        self.state = SessionState::Synced;
        self.transcript =
            Some(transcript.unwrap_or_else(|| Transcript::placeholder(NOT_FOUND_TEXT)));

        if let Some(url) = self.current_artwork.clone() {
            let http = self.http.clone();
            let params = self.params.theme;
            let tx = tx.clone();
            tokio::spawn(async move {
                let colors = match theme::fetch_pixel(&http, &url).await {
                    Ok(pixel) => theme::derive(pixel, &params),
                    Err(e) => {
                        tracing::warn!(error = %format!("{e:#}"), "artwork fetch failed");
                        theme::NEUTRAL
                    }
                };
                let _ = tx
                    .send(Event::Theme(ThemeEvent::Derived { track_id, colors }))
                    .await;
            });
        }
    }

    async fn on_no_playback(&mut self) {
        self.state = SessionState::Idle;
        self.current_track_id = None;
        self.current_artwork = None;
        self.transcript = None;
        self.emit(UiEvent::Status(NO_PLAYBACK_STATUS.to_string())).await;
        self.emit(UiEvent::Theme(theme::NEUTRAL)).await;
    }

    async fn emit(&self, event: UiEvent) {
        if self.ui_tx.send(event).await.is_err() {
            tracing::debug!("ui channel closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::NEUTRAL;

    /// Inert source: tests feed completions by hand so the coordinator
    /// logic is exercised deterministically.
    #[derive(Clone)]
    struct SilentSource;

    impl LyricsSource for SilentSource {
        fn name(&self) -> &'static str {
            "silent"
        }

        async fn search(&self, _title: &str, _artist: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    fn session(ui_tx: mpsc::Sender<UiEvent>) -> Session<SilentSource> {
        Session::new(
            Vec::new(),
            reqwest::Client::new(),
            SessionParams::default(),
            ui_tx,
        )
    }

    fn snapshot(id: &str, progress_ms: u64) -> PlaybackState {
        PlaybackState {
            track_id: id.to_string(),
            is_playing: true,
            progress_ms,
            duration_ms: 180_000,
            track_name: format!("{id} name"),
            artist_name: "artist".into(),
            primary_artist: "artist".into(),
            artwork_url: None,
        }
    }

    fn resolved(id: &str, transcript: Option<Transcript>) -> Event {
        Event::Lyrics(LyricsEvent::Resolved {
            track_id: id.to_string(),
            transcript,
        })
    }

    fn updated(id: &str, progress_ms: u64) -> Event {
        Event::Playback(PlaybackEvent::Updated(snapshot(id, progress_ms)))
    }

    fn drain(rx: &mut mpsc::Receiver<UiEvent>) -> Vec<UiEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn first_update_starts_resolving() {
        let (ui_tx, mut ui_rx) = mpsc::channel(32);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        s.handle_event(updated("t1", 0), &tx).await;

        assert_eq!(s.state(), SessionState::ResolvingLyrics);
        assert_eq!(s.current_track_id(), Some("t1"));
        let events = drain(&mut ui_rx);
        assert_eq!(
            events,
            vec![
                UiEvent::Status(SEARCHING_STATUS.to_string()),
                UiEvent::Theme(NEUTRAL),
            ]
        );
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let (ui_tx, mut ui_rx) = mpsc::channel(32);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        s.handle_event(updated("t1", 0), &tx).await;
        s.handle_event(updated("t2", 0), &tx).await;
        let _ = drain(&mut ui_rx);

        // t1's fetch lands after the track moved on.
        let old = Transcript::parse("[00:00.00]stale").unwrap();
        s.handle_event(resolved("t1", Some(old)), &tx).await;

        assert_eq!(s.state(), SessionState::ResolvingLyrics);
        assert!(s.transcript.is_none());
        assert!(drain(&mut ui_rx).is_empty());
    }

    #[tokio::test]
    async fn stale_theme_is_discarded() {
        let (ui_tx, mut ui_rx) = mpsc::channel(32);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        s.handle_event(updated("t2", 0), &tx).await;
        let _ = drain(&mut ui_rx);

        s.handle_event(
            Event::Theme(ThemeEvent::Derived {
                track_id: "t1".into(),
                colors: NEUTRAL,
            }),
            &tx,
        )
        .await;
        assert!(drain(&mut ui_rx).is_empty());
    }

    #[tokio::test]
    async fn synced_tick_emits_display() {
        let (ui_tx, mut ui_rx) = mpsc::channel(32);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        s.handle_event(updated("t1", 0), &tx).await;
        let t = Transcript::parse("[00:00.00]a\n[00:01.00]b").unwrap();
        s.handle_event(resolved("t1", Some(t)), &tx).await;
        assert_eq!(s.state(), SessionState::Synced);
        let _ = drain(&mut ui_rx);

        s.handle_event(updated("t1", 500), &tx).await;
        let events = drain(&mut ui_rx);
        assert_eq!(
            events,
            vec![UiEvent::Display {
                current: "a".into(),
                next: "b".into(),
                progress_ms: 500,
                duration_ms: 180_000,
                is_playing: true,
            }]
        );
    }

    #[tokio::test]
    async fn no_playback_resets_to_idle() {
        let (ui_tx, mut ui_rx) = mpsc::channel(32);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        s.handle_event(updated("t1", 0), &tx).await;
        let t = Transcript::parse("[00:00.00]a").unwrap();
        s.handle_event(resolved("t1", Some(t)), &tx).await;
        let _ = drain(&mut ui_rx);

        s.handle_event(Event::Playback(PlaybackEvent::NoPlayback), &tx)
            .await;
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.current_track_id(), None);
        let events = drain(&mut ui_rx);
        assert_eq!(
            events,
            vec![
                UiEvent::Status(NO_PLAYBACK_STATUS.to_string()),
                UiEvent::Theme(NEUTRAL),
            ]
        );
    }

    /// Records the artist each query carries.
    #[derive(Clone)]
    struct RecordingSource {
        artists: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl LyricsSource for RecordingSource {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search(&self, _title: &str, artist: &str) -> anyhow::Result<Option<String>> {
            self.artists.lock().unwrap().push(artist.to_string());
            Ok(None)
        }
    }

    #[tokio::test]
    async fn resolver_queries_with_primary_artist_only() {
        let (ui_tx, _ui_rx) = mpsc::channel(32);
        let (tx, mut rx) = mpsc::channel(32);
        let artists = Arc::new(std::sync::Mutex::new(Vec::new()));
        let source = RecordingSource {
            artists: artists.clone(),
        };
        let mut s = Session::new(
            vec![source],
            reqwest::Client::new(),
            SessionParams::default(),
            ui_tx,
        );

        let mut state = snapshot("t1", 0);
        state.artist_name = "Lead, Feature".into();
        state.primary_artist = "Lead".into();
        s.handle_event(Event::Playback(PlaybackEvent::Updated(state)), &tx)
            .await;

        // The spawned resolver posts its completion once the source ran.
        let ev = rx.recv().await.unwrap();
        assert!(matches!(ev, Event::Lyrics(LyricsEvent::Resolved { .. })));
        assert_eq!(*artists.lock().unwrap(), vec!["Lead".to_string()]);
    }

    #[tokio::test]
    async fn poll_sequence_end_to_end() {
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let (tx, _rx) = mpsc::channel(32);
        let mut s = session(ui_tx);

        // T1 starts; its resolver returns a two-line transcript.
        s.handle_event(updated("t1", 0), &tx).await;
        let t1 = Transcript::parse("[00:00.00]a\n[00:01.00]b").unwrap();
        s.handle_event(resolved("t1", Some(t1)), &tx).await;
        let _ = drain(&mut ui_rx);

        s.handle_event(updated("t1", 0), &tx).await;
        s.handle_event(updated("t1", 1000), &tx).await;

        // T2 starts; its resolver finds nothing.
        s.handle_event(updated("t2", 0), &tx).await;
        s.handle_event(resolved("t2", None), &tx).await;
        s.handle_event(updated("t2", 0), &tx).await;

        let events = drain(&mut ui_rx);
        assert_eq!(
            events,
            vec![
                UiEvent::Display {
                    current: "a".into(),
                    next: "b".into(),
                    progress_ms: 0,
                    duration_ms: 180_000,
                    is_playing: true,
                },
                UiEvent::Display {
                    current: "b".into(),
                    next: "".into(),
                    progress_ms: 1000,
                    duration_ms: 180_000,
                    is_playing: true,
                },
                UiEvent::Status(SEARCHING_STATUS.to_string()),
                UiEvent::Theme(NEUTRAL),
                UiEvent::Display {
                    current: NOT_FOUND_TEXT.to_string(),
                    next: "".into(),
                    progress_ms: 0,
                    duration_ms: 180_000,
                    is_playing: true,
                },
            ]
        );
    }
}
