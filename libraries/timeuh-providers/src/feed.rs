//! Now-playing feed client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use timeuh_core::{FeedEntry, NowPlayingSource, TimeuhError};
use tracing::{debug, warn};

use crate::error::{ProviderError, Result};
use crate::http;

/// Key of the feed's non-track bookkeeping entry
const LOG_KEY: &str = "log";

#[derive(Debug, Deserialize)]
struct FeedBody {
    result: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    time: String,
    #[serde(default)]
    titre: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default, rename = "imgSrc")]
    img_src: Option<String>,
}

impl From<RawEntry> for FeedEntry {
    fn from(raw: RawEntry) -> Self {
        FeedEntry {
            time: raw.time,
            title: raw.titre.unwrap_or_default(),
            album: raw.album,
            artist: raw.artist,
            image: raw.img_src,
        }
    }
}

/// Client for the station's now-playing endpoint.
///
/// The endpoint answers with the current track and the last few ones.
pub struct NowPlayingClient {
    http: Client,
    endpoint: String,
}

impl NowPlayingClient {
    /// Create a client for `endpoint`; `timeout` bounds both connection and
    /// the whole request.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::client(timeout)?,
            endpoint: http::endpoint(endpoint)?,
        })
    }

    /// Fetch and decode the feed
    pub async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        debug!(url = %self.endpoint, "Fetching now-playing feed");

        let response = http::send(self.http.get(&self.endpoint)).await?;
        let body: FeedBody = http::json(response, "now-playing feed").await?;

        let entries: Vec<FeedEntry> = body
            .result
            .into_iter()
            .filter(|(key, _)| key != LOG_KEY)
            .filter_map(|(key, value)| match serde_json::from_value::<RawEntry>(value) {
                Ok(raw) => Some(raw.into()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable feed entry");
                    None
                }
            })
            .collect();

        debug!(count = entries.len(), "Now-playing feed fetched");

        Ok(entries)
    }
}

#[async_trait]
impl NowPlayingSource for NowPlayingClient {
    async fn fetch(&self) -> timeuh_core::Result<Vec<FeedEntry>> {
        self.fetch_entries().await.map_err(|e| match e {
            // An unreachable feed and an erroring one are both failures
            ProviderError::Status { .. } | ProviderError::Request(_) => {
                TimeuhError::network(e.to_string())
            }
            other => other.into(),
        })
    }
}
