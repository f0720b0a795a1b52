/// Traits for the external services Timeuh Machine talks to
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AccessToken, FeedEntry, PlaylistSummary, Provider, ProviderLinks, ResolvedLinks};

/// Source of the station's now-playing entries
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    /// Fetch the current and last few broadcast entries
    ///
    /// # Errors
    /// `TimeuhError::Network` when the feed cannot be reached,
    /// `TimeuhError::BadResponse` when its body cannot be understood
    async fn fetch(&self) -> Result<Vec<FeedEntry>>;
}

/// Music link resolution service
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Search a track and collect its share link, provider ids and cover.
    ///
    /// `Ok(None)` when the service knows nothing about it.
    async fn resolve(&self, title: &str, artist: &str) -> Result<Option<ResolvedLinks>>;

    /// Read the provider ids listed on an existing share page
    async fn links_for_share_page(&self, share_link: &str) -> Result<ProviderLinks>;
}

/// A streaming provider's OAuth and playlist API
///
/// Track identifiers are the values stored in the provider's link column.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Which provider this is
    fn provider(&self) -> Provider;

    /// URL the visitor is sent to in order to grant access
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String>;

    /// Trade an authorization code for an access token
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<AccessToken>;

    /// The visitor's playlists
    async fn user_playlists(&self, token: &AccessToken) -> Result<Vec<PlaylistSummary>>;

    /// Create a new playlist for the visitor
    async fn create_playlist(&self, token: &AccessToken, name: &str) -> Result<PlaylistSummary>;

    /// Identifiers of the tracks already in a playlist
    async fn playlist_track_ids(
        &self,
        token: &AccessToken,
        playlist_id: &str,
    ) -> Result<Vec<String>>;

    /// Append tracks to a playlist (callers batch the ids)
    async fn add_tracks(
        &self,
        token: &AccessToken,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<()>;
}
