//! Playback poller
//!
//! Queries the playback source on a fixed interval and forwards snapshots
//! as session events. "No playback" is edge-triggered: it fires once after
//! a configurable run of consecutive empty polls and holds until a track
//! reappears. Transient query failures are logged and skipped without
//! touching the empty-poll counter.

use crate::app::events::{Event, PlaybackEvent};
use crate::spotify::PlaybackSource;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Consecutive empty polls before declaring no playback.
    pub no_playback_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            no_playback_threshold: 2,
        }
    }
}

/// Edge trigger for the no-playback condition.
#[derive(Debug)]
struct NoPlaybackGate {
    threshold: u32,
    misses: u32,
    announced: bool,
}

impl NoPlaybackGate {
    fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            misses: 0,
            announced: false,
        }
    }

    /// A tick with an active track. Re-arms the gate.
    fn hit(&mut self) {
        self.misses = 0;
        self.announced = false;
    }

    /// A tick with no track. Returns true exactly once per entry into the
    /// no-playback condition.
    fn miss(&mut self) -> bool {
        self.misses = self.misses.saturating_add(1);
        if self.misses >= self.threshold && !self.announced {
            self.announced = true;
            return true;
        }
        false
    }
}

/// Poll until the stop channel flips. Exits within one tick of the signal
/// and never emits after observing it.
pub async fn run<P: PlaybackSource>(
    source: P,
    tx: mpsc::Sender<Event>,
    mut stop: watch::Receiver<bool>,
    cfg: PollerConfig,
) {
    let mut gate = NoPlaybackGate::new(cfg.no_playback_threshold);
    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let result = source.current_playback().await;
                // A query may have been in flight when shutdown arrived;
                // drop its outcome instead of emitting past the stop.
                if *stop.borrow() {
                    break;
                }
                match result {
                    Ok(Some(state)) => {
                        gate.hit();
                        if tx.send(Event::Playback(PlaybackEvent::Updated(state))).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        if gate.miss()
                            && tx.send(Event::Playback(PlaybackEvent::NoPlayback)).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %format!("{e:#}"), "playback poll failed");
                    }
                }
            }
        }
    }
    tracing::debug!("playback poller stopped");
}
