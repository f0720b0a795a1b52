//! Spotify Web API client (authorization code flow).

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use timeuh_core::{AccessToken, PlaylistService, PlaylistSummary, Provider};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, Result};
use crate::http;

/// Only public playlists are created
const SCOPE: &str = "playlist-modify-public";

/// Spotify's maximum page size for playlist listings
const PLAYLISTS_PAGE_SIZE: u32 = 50;

/// Spotify application settings
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Accounts service, `https://accounts.spotify.com`
    pub accounts_url: String,
    /// Web API root, `https://api.spotify.com/v1`
    pub api_url: String,
    pub timeout: Duration,
}

impl SpotifyConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Me {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    #[serde(default)]
    track: Option<TrackRef>,
}

#[derive(Debug, Deserialize)]
struct TrackRef {
    #[serde(default)]
    uri: Option<String>,
}

/// Spotify playlist client
///
/// Track identifiers are `spotify:track:<id>` URIs.
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    accounts_url: String,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        Ok(Self {
            http: http::client(config.timeout)?,
            client_id: config.client_id,
            client_secret: config.client_secret,
            accounts_url: http::base_url(&config.accounts_url)?,
            api_url: http::base_url(&config.api_url)?,
        })
    }

    fn bearer<'a>(&self, token: &'a AccessToken) -> Result<&'a str> {
        if token.is_usable(Utc::now()) {
            Ok(&token.token)
        } else {
            Err(ProviderError::Unauthorized {
                provider: Provider::Spotify,
                message: "Missing access token or token expired".to_string(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: &str, what: &str) -> Result<T> {
        let response = http::send(self.http.get(url).bearer_auth(token))
            .await
            .map_err(|e| e.for_provider(Provider::Spotify))?;
        http::json(response, what).await
    }

    /// Follow `next` links until the listing is exhausted
    async fn get_all<T: DeserializeOwned>(
        &self,
        token: &str,
        first: String,
        what: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next {
            let page: Page<T> = self.get_json(token, &url, what).await?;
            items.extend(page.items);
            next = page.next;
        }

        Ok(items)
    }

    async fn current_user_id(&self, token: &str) -> Result<String> {
        let me: Me = self
            .get_json(token, &format!("{}/me", self.api_url), "Spotify profile")
            .await?;
        Ok(me.id)
    }
}

fn segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[async_trait]
impl PlaylistService for SpotifyClient {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    fn authorize_url(&self, redirect_uri: &str, state: &str) -> timeuh_core::Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> timeuh_core::Result<AccessToken> {
        debug!("Exchanging Spotify authorization code");

        let response = http::send(
            self.http
                .post(format!("{}/api/token", self.accounts_url))
                .basic_auth(&self.client_id, Some(&self.client_secret))
                .form(&[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                ]),
        )
        .await
        .map_err(|e| e.for_provider(Provider::Spotify))?;
        let token: TokenResponse = http::json(response, "Spotify token").await?;

        let expires_at = token
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));

        Ok(AccessToken::new(token.access_token, expires_at))
    }

    async fn user_playlists(
        &self,
        token: &AccessToken,
    ) -> timeuh_core::Result<Vec<PlaylistSummary>> {
        let bearer = self.bearer(token)?;
        let first = format!("{}/me/playlists?limit={}", self.api_url, PLAYLISTS_PAGE_SIZE);
        let items: Vec<PlaylistItem> = self.get_all(bearer, first, "Spotify playlists").await?;

        Ok(items
            .into_iter()
            .map(|p| PlaylistSummary {
                id: p.id,
                name: p.name,
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> timeuh_core::Result<PlaylistSummary> {
        let bearer = self.bearer(token)?;
        let user_id = self.current_user_id(bearer).await?;

        let response = http::send(
            self.http
                .post(format!("{}/users/{}/playlists", self.api_url, segment(&user_id)))
                .bearer_auth(bearer)
                .json(&json!({ "name": name, "public": true })),
        )
        .await
        .map_err(|e| e.for_provider(Provider::Spotify))?;
        let created: PlaylistItem = http::json(response, "Spotify playlist").await?;

        info!(playlist_id = %created.id, name = %created.name, "Created Spotify playlist");

        Ok(PlaylistSummary {
            id: created.id,
            name: created.name,
        })
    }

    async fn playlist_track_ids(
        &self,
        token: &AccessToken,
        playlist_id: &str,
    ) -> timeuh_core::Result<Vec<String>> {
        let bearer = self.bearer(token)?;
        let first = format!(
            "{}/playlists/{}/tracks?fields=items(track(uri)),next&limit=100",
            self.api_url,
            segment(playlist_id)
        );
        let items: Vec<PlaylistTrack> = self
            .get_all(bearer, first, "Spotify playlist tracks")
            .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.track.and_then(|t| t.uri))
            .collect())
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

        http::send(
            self.http
                .post(format!("{}/playlists/{}/tracks", self.api_url, segment(playlist_id)))
                .bearer_auth(bearer)
                .json(&json!({ "uris": track_ids })),
        )
        .await
        .map_err(|e| e.for_provider(Provider::Spotify))?;

        debug!(
            playlist_id = %playlist_id,
            count = track_ids.len(),
            "Added tracks to Spotify playlist"
        );

        Ok(())
    }
}
