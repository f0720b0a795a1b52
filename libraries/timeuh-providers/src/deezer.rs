//! Deezer API client.
//!
//! Deezer reports most failures as a `200 OK` carrying an `error` object, so
//! every body is checked before being decoded.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use timeuh_core::{AccessToken, PlaylistService, PlaylistSummary, Provider};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, Result};
use crate::http;

const PERMS: &str = "manage_library";

/// Upper bound Deezer accepts for a playlist track listing
const TRACKS_LIMIT: u32 = 3000;

/// Body returned by the token endpoint for an unknown or reused code
const WRONG_CODE: &str = "wrong code";

/// Deezer application settings
#[derive(Debug, Clone)]
pub struct DeezerConfig {
    pub app_id: String,
    pub secret: String,
    /// OAuth root, `https://connect.deezer.com/oauth`
    pub connect_url: String,
    /// API root, `https://api.deezer.com`
    pub api_url: String,
    pub timeout: Duration,
}

impl DeezerConfig {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
            connect_url: "https://connect.deezer.com/oauth".to_string(),
            api_url: "https://api.deezer.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Deezer sends ids as numbers, and sometimes numbers as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(i64),
    Text(String),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Loose::Number(n) => n.to_string(),
            Loose::Text(s) => s,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Loose::Number(n) => Some(*n),
            Loose::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires: Option<Loose>,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: Loose,
    title: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: Loose,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    id: Loose,
}

/// Deezer playlist client
///
/// Track identifiers are bare numeric Deezer track ids.
pub struct DeezerClient {
    http: Client,
    app_id: String,
    secret: String,
    connect_url: String,
    api_url: String,
}

impl DeezerClient {
    pub fn new(config: DeezerConfig) -> Result<Self> {
        Ok(Self {
            http: http::client(config.timeout)?,
            app_id: config.app_id,
            secret: config.secret,
            connect_url: http::base_url(&config.connect_url)?,
            api_url: http::base_url(&config.api_url)?,
        })
    }

    fn bearer<'a>(&self, token: &'a AccessToken) -> Result<&'a str> {
        if token.is_usable(Utc::now()) {
            Ok(&token.token)
        } else {
            Err(ProviderError::Unauthorized {
                provider: Provider::Deezer,
                message: "Missing access token or token expired".to_string(),
            })
        }
    }

    fn api(&self, path: &str, token: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.api_url, path))
            .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("access_token", token)
            .extend_pairs(params);
        Ok(url)
    }

    /// Send an API request and decode its body, surfacing in-body errors
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = http::send(request)
            .await
            .map_err(|e| e.for_provider(Provider::Deezer))?;
        let body: Value = http::json(response, what).await?;

        if let Some(error) = body.get("error") {
            let kind = error.get("type").and_then(Value::as_str).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(if kind == "OAuthException" {
                ProviderError::Unauthorized {
                    provider: Provider::Deezer,
                    message,
                }
            } else {
                ProviderError::Api {
                    provider: Provider::Deezer,
                    message,
                }
            });
        }

        serde_json::from_value(body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    /// Fetch every page of a listing; `next` links may omit the token
    async fn list_all<T: DeserializeOwned>(
        &self,
        first: Url,
        token: &str,
        what: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next {
            let page: Listing<T> = self.call(self.http.get(url), what).await?;
            items.extend(page.data);
            next = match page.next {
                Some(raw) => {
                    let mut url = Url::parse(&raw)
                        .map_err(|e| ProviderError::ParseError(format!("Bad next link: {}", e)))?;
                    if !url.query_pairs().any(|(k, _)| k == "access_token") {
                        url.query_pairs_mut().append_pair("access_token", token);
                    }
                    Some(url)
                }
                None => None,
            };
        }

        Ok(items)
    }
}

#[async_trait]
impl PlaylistService for DeezerClient {
    fn provider(&self) -> Provider {
        Provider::Deezer
    }

    fn authorize_url(&self, redirect_uri: &str, state: &str) -> timeuh_core::Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/auth.php", self.connect_url),
            &[
                ("app_id", self.app_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("perms", PERMS),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> timeuh_core::Result<AccessToken> {
        debug!("Exchanging Deezer authorization code");

        let response = http::send(
            self.http
                .get(format!("{}/access_token.php", self.connect_url))
                .query(&[
                    ("app_id", self.app_id.as_str()),
                    ("secret", self.secret.as_str()),
                    ("code", code),
                    ("output", "json"),
                ]),
        )
        .await
        .map_err(|e| e.for_provider(Provider::Deezer))?;

        let body = response.text().await.map_err(ProviderError::Request)?;
        if body.trim().is_empty() || body.trim() == WRONG_CODE {
            return Err(ProviderError::Unauthorized {
                provider: Provider::Deezer,
                message: "Authorization code refused".to_string(),
            }
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse Deezer token: {}", e))
        })?;

        // expires=0 marks a token that never expires (offline_access)
        let expires_at = token
            .expires
            .and_then(|e| e.as_i64())
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));

        Ok(AccessToken::new(token.access_token, expires_at))
    }

    async fn user_playlists(
        &self,
        token: &AccessToken,
    ) -> timeuh_core::Result<Vec<PlaylistSummary>> {
        let bearer = self.bearer(token)?;
        let url = self.api("user/me/playlists", bearer, &[])?;
        let items: Vec<PlaylistItem> = self.list_all(url, bearer, "Deezer playlists").await?;

        Ok(items
            .into_iter()
            .map(|p| PlaylistSummary {
                id: p.id.into_string(),
                name: p.title,
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> timeuh_core::Result<PlaylistSummary> {
        let bearer = self.bearer(token)?;
        let url = self.api("user/me/playlists", bearer, &[])?;
        let created: Created = self
            .call(self.http.post(url).form(&[("title", name)]), "Deezer playlist")
            .await?;
        let id = created.id.into_string();

        info!(playlist_id = %id, name = %name, "Created Deezer playlist");

        Ok(PlaylistSummary {
            id,
            name: name.to_string(),
        })
    }

    async fn playlist_track_ids(
        &self,
        token: &AccessToken,
        playlist_id: &str,
    ) -> timeuh_core::Result<Vec<String>> {
        let bearer = self.bearer(token)?;
        let limit = TRACKS_LIMIT.to_string();
        let url = self.api(
            &format!("playlist/{}/tracks", playlist_id.trim()),
            bearer,
            &[("limit", limit.as_str())],
        )?;
        let items: Vec<TrackItem> = self
            .list_all(url, bearer, "Deezer playlist tracks")
            .await?;

        Ok(items.into_iter().map(|t| t.id.into_string()).collect())
    }

    async fn add_tracks(
        &self,
        token: &AccessToken,
        playlist_id: &str,
        track_ids: &[String],
    ) -> timeuh_core::Result<()> {
        let bearer = self.bearer(token)?;
        if track_ids.is_empty() {
            return Ok(());
        }

        let url = self.api(&format!("playlist/{}/tracks", playlist_id.trim()), bearer, &[])?;
        let songs = track_ids.join(",");
        let _: Value = self
            .call(
                self.http.post(url).form(&[("songs", songs.as_str())]),
                "Deezer track addition",
            )
            .await?;

        debug!(
            playlist_id = %playlist_id,
            count = track_ids.len(),
            "Added tracks to Deezer playlist"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_ids() {
        let n: Loose = serde_json::from_str("908622995").unwrap();
        assert_eq!(n.into_string(), "908622995");
        let s: Loose = serde_json::from_str("\"3600\"").unwrap();
        assert_eq!(s.as_i64(), Some(3600));
    }
}
