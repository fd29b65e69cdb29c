//! Application wiring
//!
//! Builds the Spotify client and source cascade, runs the poller and the
//! single-consumer session event loop, and feeds display events to a thin
//! terminal presenter. Ctrl-c flips the stop channel; the poller exits
//! within a tick and the loop drains out.

pub mod events;
pub mod session;

use crate::config::Config;
use crate::lyrics::{self, Source};
use crate::spotify::poller::{self, PollerConfig};
use crate::spotify::SpotifyClient;
use crate::theme::ThemeParams;
use anyhow::Context;
use events::{Event, UiEvent};
use session::{Session, SessionParams};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub const USER_AGENT: &str = concat!("chorus/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("build reqwest client")
}

pub async fn run(cfg: Config, spotify: SpotifyClient) -> anyhow::Result<()> {
    let http = http_client()?;
    let sources: Vec<Source> = lyrics::default_sources(http.clone());

    let (tx, mut rx) = mpsc::channel::<Event>(256);
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(256);
    let (stop_tx, stop_rx) = watch::channel(false);

    let params = SessionParams {
        source_timeout: Duration::from_secs(cfg.sources.timeout_secs),
        theme: ThemeParams {
            luminance_threshold: cfg.theme.luminance_threshold,
            darken_percent: cfg.theme.darken_percent,
            lighten_percent: cfg.theme.lighten_percent,
        },
    };
    let mut session = Session::new(sources, http, params, ui_tx.clone());

    let poller_cfg = PollerConfig {
        interval: Duration::from_secs(cfg.poll.interval_secs.max(1)),
        no_playback_threshold: cfg.poll.no_playback_threshold,
    };
    let poller = tokio::spawn(poller::run(spotify, tx.clone(), stop_rx, poller_cfg));
    let presenter = tokio::spawn(present(ui_rx));

    let _ = ui_tx
        .send(UiEvent::Status("Waiting for Spotify...".to_string()))
        .await;

    let mut stop_watch = stop_tx.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            let _ = stop_tx.send(true);
        }
    });

    loop {
        tokio::select! {
            changed = stop_watch.changed() => {
                if changed.is_err() || *stop_watch.borrow() {
                    break;
                }
            }
            ev = rx.recv() => {
                let Some(ev) = ev else { break };
                session.handle_event(ev, &tx).await;
            }
        }
    }

    poller.await.context("join poller")?;
    // The session owns the last ui sender; dropping it ends the presenter.
    drop(session);
    drop(ui_tx);
    let _ = presenter.await;
    Ok(())
}

/// Minimal stdout presenter: status lines and the current lyric line,
/// printed only when they change.
async fn present(mut ui_rx: mpsc::Receiver<UiEvent>) {
    let mut last_line = String::new();
    while let Some(ev) = ui_rx.recv().await {
        match ev {
            UiEvent::Display { current, .. } => {
                if current != last_line {
                    if !current.is_empty() {
                        println!("{current}");
                    }
                    last_line = current;
                }
            }
            UiEvent::Status(message) => {
                println!("-- {message}");
                last_line.clear();
            }
            UiEvent::Theme(colors) => {
                tracing::debug!(
                    background = %colors.background,
                    foreground = %colors.foreground,
                    "theme updated"
                );
            }
        }
    }
}
