//! Lyrics resolution
//!
//! This module provides:
//! - the timed-text parser and transcript types
//! - the progress-to-line sync lookup
//! - an ordered cascade of external lyric sources, tried until one yields
//!   a parseable transcript

pub mod lrclib;
pub mod megalobiz;
pub mod parser;
pub mod sync;

pub use parser::{TimedLine, Transcript};
pub use sync::{SyncResult, sync_at};

use std::future::Future;
use std::time::Duration;

use lrclib::LrclibSource;
use megalobiz::MegalobizSource;

/// One external lyrics provider. `Ok(None)` means "nothing for this
/// track"; `Err` is a transport failure. Both advance the cascade.
pub trait LyricsSource {
    fn name(&self) -> &'static str;
    fn search(
        &self,
        title: &str,
        artist: &str,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

/// The production cascade, in declared order.
#[derive(Debug, Clone)]
pub enum Source {
    Lrclib(LrclibSource),
    Megalobiz(MegalobizSource),
}

impl LyricsSource for Source {
    fn name(&self) -> &'static str {
        match self {
            Source::Lrclib(_) => "lrclib",
            Source::Megalobiz(_) => "megalobiz",
        }
    }

    async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Option<String>> {
        match self {
            Source::Lrclib(s) => s.search(title, artist).await,
            Source::Megalobiz(s) => s.search(title, artist).await,
        }
    }
}

/// Build the default source cascade sharing one HTTP client.
pub fn default_sources(http: reqwest::Client) -> Vec<Source> {
    vec![
        Source::Lrclib(LrclibSource::new(http.clone())),
        Source::Megalobiz(MegalobizSource::new(http)),
    ]
}

/// Strip qualifier suffixes so source queries use the base title.
///
/// Cuts at the first `(` or `-` that is followed later by one of the known
/// qualifier keywords, then truncates at the first `/`.
pub fn normalize_title(raw: &str) -> String {
    const QUALIFIERS: [&str; 7] = [
        "remaster", "live", "acoustic", "version", "edit", "mix", "radio",
    ];

    let cut = raw
        .char_indices()
        .filter(|&(_, c)| c == '(' || c == '-')
        .find(|&(i, _)| {
            let tail = raw[i..].to_lowercase();
            QUALIFIERS.iter().any(|q| tail.contains(q))
        })
        .map(|(i, _)| i);

    let head = match cut {
        Some(i) => &raw[..i],
        None => raw,
    };
    let head = head.split('/').next().unwrap_or(head);
    head.trim().to_string()
}

/// Query each source in order with a bounded timeout, returning the first
/// non-empty parsed transcript. Exhaustion is `None`, never an error.
pub async fn resolve<S: LyricsSource>(
    sources: &[S],
    title: &str,
    artist: &str,
    duration_ms: u64,
    timeout: Duration,
) -> Option<Transcript> {
    let title = normalize_title(title);
    tracing::debug!(%title, %artist, duration_ms, "resolving lyrics");

    for source in sources {
        match tokio::time::timeout(timeout, source.search(&title, artist)).await {
            Ok(Ok(Some(raw))) => {
                if let Some(transcript) = Transcript::parse(&raw) {
                    tracing::info!(source = source.name(), lines = transcript.len(), "lyrics found");
                    return Some(transcript);
                }
                tracing::debug!(source = source.name(), "result had no parseable lines");
            }
            Ok(Ok(None)) => {
                tracing::debug!(source = source.name(), "no result");
            }
            Ok(Err(e)) => {
                tracing::warn!(source = source.name(), error = %format!("{e:#}"), "source failed");
            }
            Err(_) => {
                tracing::warn!(source = source.name(), "source timed out");
            }
        }
    }

    None
}
