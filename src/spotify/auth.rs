//! Spotify OAuth token lifecycle
//!
//! Authorization-code flow with a cached token file in the data dir.
//! The access token is consumed opaquely by the API client; this module
//! only loads, exchanges, and refreshes it.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const REDIRECT_URI: &str = "https://example.com/callback";
const SCOPES: &str = "user-read-currently-playing user-read-playback-state";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Config values win; environment variables are the fallback.
    pub fn resolve(
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> anyhow::Result<Self> {
        let client_id = match client_id {
            Some(v) => v.to_string(),
            None => std::env::var("SPOTIFY_CLIENT_ID")
                .context("spotify client_id not in config and SPOTIFY_CLIENT_ID unset")?,
        };
        let client_secret = match client_secret {
            Some(v) => v.to_string(),
            None => std::env::var("SPOTIFY_CLIENT_SECRET")
                .context("spotify client_secret not in config and SPOTIFY_CLIENT_SECRET unset")?,
        };
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp at which `access_token` stops working.
    pub expires_at: i64,
}

impl TokenCache {
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc().unix_timestamp() >= self.expires_at
    }

    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cache = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(cache))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string(self).context("serialize token cache")?;
        std::fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

impl TokenResponse {
    fn into_cache(self, old_refresh: Option<String>) -> TokenCache {
        TokenCache {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(old_refresh),
            expires_at: OffsetDateTime::now_utc().unix_timestamp() + self.expires_in,
        }
    }
}

/// URL the user opens to grant access.
pub fn authorize_url(client_id: &str) -> String {
    format!(
        "{AUTHORIZE_URL}?client_id={}&response_type=code&redirect_uri={}&scope={}",
        urlencoding::encode(client_id),
        urlencoding::encode(REDIRECT_URI),
        urlencoding::encode(SCOPES)
    )
}

/// Pull the `code` query parameter out of a pasted redirect URL.
pub fn code_from_redirect(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("code="))
        .map(|code| code.split('#').next().unwrap_or(code))
}

pub async fn exchange_code(
    http: &reqwest::Client,
    creds: &Credentials,
    code: &str,
) -> anyhow::Result<TokenCache> {
    let resp: TokenResponse = http
        .post(TOKEN_URL)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await
        .context("send token exchange")?
        .error_for_status()
        .context("token exchange status")?
        .json()
        .await
        .context("parse token exchange json")?;
    Ok(resp.into_cache(None))
}

pub async fn refresh(
    http: &reqwest::Client,
    creds: &Credentials,
    refresh_token: &str,
) -> anyhow::Result<TokenCache> {
    let resp: TokenResponse = http
        .post(TOKEN_URL)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .context("send token refresh")?
        .error_for_status()
        .context("token refresh status")?
        .json()
        .await
        .context("parse token refresh json")?;
    Ok(resp.into_cache(Some(refresh_token.to_string())))
}
