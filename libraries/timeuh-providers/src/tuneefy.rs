//! Music-link resolution through tuneefy.
//!
//! A search returns, for the best matching track, a share intent, the album
//! cover and the track's page on each platform. Sharing the intent yields the
//! public link stored with the track.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use timeuh_core::links;
use timeuh_core::{LinkResolver, ProviderLinks, ResolvedLinks};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, Result};
use crate::http;

/// Placeholder substituted in endpoint templates
const PLACEHOLDER: &str = "%s";

/// Tuneefy API settings
#[derive(Debug, Clone)]
pub struct TuneefyConfig {
    /// Bearer token
    pub token: String,
    /// Search endpoint template; `%s` is replaced by the url-encoded query
    pub track_endpoint: String,
    /// Share endpoint template; `%s` is replaced by the share intent
    pub share_endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    share: Share,
    #[serde(default)]
    musical_entity: MusicalEntity,
}

#[derive(Debug, Deserialize)]
struct Share {
    intent: String,
}

#[derive(Debug, Default, Deserialize)]
struct MusicalEntity {
    #[serde(default)]
    album: Option<Album>,
    #[serde(default)]
    links: PlatformLinks,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlatformLinks {
    #[serde(default)]
    spotify: Vec<String>,
    #[serde(default)]
    deezer: Vec<String>,
}

impl PlatformLinks {
    fn normalise(&self) -> ProviderLinks {
        ProviderLinks {
            spotify: self.spotify.first().and_then(|l| links::spotify_uri(l)),
            deezer: self.deezer.first().and_then(|l| links::deezer_track_id(l)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShareResponse {
    link: String,
}

#[derive(Debug, Deserialize)]
struct SharePage {
    #[serde(default)]
    links: PlatformLinks,
}

/// Tuneefy API client
pub struct TuneefyClient {
    http: Client,
    token: String,
    track_endpoint: String,
    share_endpoint: String,
}

impl TuneefyClient {
    pub fn new(config: TuneefyConfig) -> Result<Self> {
        for template in [&config.track_endpoint, &config.share_endpoint] {
            if !template.contains(PLACEHOLDER) {
                return Err(ProviderError::InvalidUrl(format!(
                    "Endpoint template '{}' has no {} placeholder",
                    template, PLACEHOLDER
                )));
            }
            http::endpoint(&template.replace(PLACEHOLDER, "x"))?;
        }

        Ok(Self {
            http: http::client(config.timeout)?,
            token: config.token,
            track_endpoint: config.track_endpoint,
            share_endpoint: config.share_endpoint,
        })
    }

    /// Search for a track and share its best match
    pub async fn search(&self, title: &str, artist: &str) -> Result<Option<ResolvedLinks>> {
        let term = format!("{} {}", title.trim(), artist.trim());
        let encoded: String =
            url::form_urlencoded::byte_serialize(term.trim().as_bytes()).collect();
        let url = self.track_endpoint.replace(PLACEHOLDER, &encoded);

        debug!(term = %term.trim(), "Searching tuneefy");

        let response = http::send(
            self.http
                .get(&url)
                .bearer_auth(&self.token)
                .header(ACCEPT, "application/json"),
        )
        .await?;
        let search: SearchResponse = http::json(response, "tuneefy search").await?;

        let Some(best) = search.results.into_iter().next() else {
            debug!(term = %term.trim(), "No tuneefy result");
            return Ok(None);
        };

        let share_link = self.share(&best.share.intent).await?;
        let resolved = ResolvedLinks {
            share_link,
            providers: best.musical_entity.links.normalise(),
            image: best
                .musical_entity
                .album
                .and_then(|a| a.picture)
                .filter(|p| !p.trim().is_empty()),
        };

        info!(
            term = %term.trim(),
            link = %resolved.share_link,
            spotify = resolved.providers.spotify.is_some(),
            deezer = resolved.providers.deezer.is_some(),
            "Resolved track links"
        );

        Ok(Some(resolved))
    }

    async fn share(&self, intent: &str) -> Result<String> {
        let url = self.share_endpoint.replace(PLACEHOLDER, intent);

        let response = http::send(
            self.http
                .get(&url)
                .bearer_auth(&self.token)
                .header(ACCEPT, "application/json"),
        )
        .await?;
        let share: ShareResponse = http::json(response, "tuneefy share").await?;

        Ok(share.link)
    }

    /// Read the platform links listed on a public share page
    pub async fn share_page_links(&self, share_link: &str) -> Result<ProviderLinks> {
        let mut url = Url::parse(share_link)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", share_link, e)))?;
        url.query_pairs_mut().append_pair("format", "json");

        debug!(url = %url, "Reading share page");

        let response = http::send(self.http.get(url).header(ACCEPT, "application/json")).await?;
        let page: SharePage = http::json(response, "share page").await?;

        Ok(page.links.normalise())
    }
}

#[async_trait]
impl LinkResolver for TuneefyClient {
    async fn resolve(
        &self,
        title: &str,
        artist: &str,
    ) -> timeuh_core::Result<Option<ResolvedLinks>> {
        Ok(self.search(title, artist).await?)
    }

    async fn links_for_share_page(&self, share_link: &str) -> timeuh_core::Result<ProviderLinks> {
        Ok(self.share_page_links(share_link).await?)
    }
}
