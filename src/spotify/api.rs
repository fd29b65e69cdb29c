//! Spotify Web API client (currently-playing endpoint)

use crate::spotify::auth::{self, Credentials, TokenCache};
use crate::spotify::{PlaybackSource, PlaybackState};
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    creds: Credentials,
    token_path: PathBuf,
    token: Mutex<Option<TokenCache>>,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    inner: Arc<Inner>,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<String>,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl SpotifyClient {
    pub fn new(
        http: reqwest::Client,
        creds: Credentials,
        token_path: PathBuf,
    ) -> anyhow::Result<Self> {
        let token = TokenCache::load(&token_path)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                creds,
                token_path,
                token: Mutex::new(token),
            }),
        })
    }

    pub async fn has_token(&self) -> bool {
        self.inner.token.lock().await.is_some()
    }

    /// Run the paste-the-redirect-URL login flow result: exchange the
    /// authorization code and persist the token cache.
    pub async fn login_with_code(&self, code: &str) -> anyhow::Result<()> {
        let cache = auth::exchange_code(&self.inner.http, &self.inner.creds, code).await?;
        cache.save(&self.inner.token_path)?;
        *self.inner.token.lock().await = Some(cache);
        Ok(())
    }

    /// Current access token, refreshing through the cached refresh token
    /// when expired.
    async fn bearer(&self) -> anyhow::Result<String> {
        let mut guard = self.inner.token.lock().await;
        let cache = guard
            .as_ref()
            .context("not authenticated, run `chorus login` first")?;

        if !cache.is_expired() {
            return Ok(cache.access_token.clone());
        }

        let refresh_token = cache
            .refresh_token
            .clone()
            .context("token expired and no refresh token cached")?;
        let fresh = auth::refresh(&self.inner.http, &self.inner.creds, &refresh_token).await?;
        fresh.save(&self.inner.token_path)?;
        let access = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(access)
    }

    async fn fetch_currently_playing(&self) -> anyhow::Result<Option<PlaybackState>> {
        let bearer = self.bearer().await?;
        let response = self
            .inner
            .http
            .get(format!(
                "{BASE_URL}/me/player/currently-playing?market=from_token"
            ))
            .bearer_auth(bearer)
            .send()
            .await
            .context("send currently-playing request")?;

        // 204 means no active session.
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("currently-playing http status")?;

        let body = response
            .text()
            .await
            .context("read currently-playing body")?;
        if body.is_empty() {
            return Ok(None);
        }

        let playing: CurrentlyPlaying =
            serde_json::from_str(&body).context("parse currently-playing json")?;
        Ok(snapshot_from(playing))
    }
}

impl PlaybackSource for SpotifyClient {
    async fn current_playback(&self) -> anyhow::Result<Option<PlaybackState>> {
        self.fetch_currently_playing().await
    }
}

/// A response without a track item counts as "nothing playing", same as
/// an empty response.
fn snapshot_from(playing: CurrentlyPlaying) -> Option<PlaybackState> {
    let item = playing.item?;
    let track_id = item.id?;

    let primary_artist = item
        .artists
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    let artist_name = item
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    // The last image in the list is the smallest; one pixel is all the
    // theme needs.
    let artwork_url = item
        .album
        .and_then(|a| a.images.into_iter().next_back())
        .map(|i| i.url);

    Some(PlaybackState {
        track_id,
        is_playing: playing.is_playing,
        progress_ms: playing.progress_ms.unwrap_or(0),
        duration_ms: item.duration_ms,
        track_name: item.name,
        artist_name,
        primary_artist,
        artwork_url,
    })
}
