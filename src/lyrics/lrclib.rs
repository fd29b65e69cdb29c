//! LRCLIB source
//!
//! LRCLIB is a free lyrics API serving synced (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LrclibSource {
    http: reqwest::Client,
    base_url: String,
}

impl LrclibSource {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";

    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Search for synced lyrics. `Ok(None)` means the source has nothing
    /// for this track; `Err` is a transport problem.
    pub async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let url = format!(
            "{}/search?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(artist)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("send lrclib search")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().context("lrclib http status")?;

        let hits: Vec<SearchHit> = response.json().await.context("parse lrclib json")?;
        Ok(hits.into_iter().find_map(|h| h.synced_lyrics))
    }
}
