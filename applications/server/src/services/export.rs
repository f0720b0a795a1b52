//! Playlist export through a provider's OAuth flow
//!
//! `initiate` gathers the period's provider track ids, parks them under a
//! random `state` token and sends the visitor to the provider's consent page.
//! The provider then redirects to `finalize`, which trades the code for a
//! token and writes the playlist. The visitor is finally sent back to the
//! page they came from, with the outcome in the query string.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use timeuh_core::{
    AccessToken, ExportPeriod, PlaylistService, Provider, Result, TimeuhError, TrackStore,
};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

/// How long a visitor has to grant access
pub const PENDING_EXPORT_TTL_MINUTES: i64 = 15;

/// Tracks added per request; Spotify accepts at most 100
pub const ADD_BATCH_SIZE: usize = 80;

/// Outcome reported back to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// A new playlist was created
    Created,
    /// New tracks were appended to an existing playlist
    Updated,
    /// The existing playlist already had every track
    NoNewTracks,
    /// The period has no track on this provider
    NoTracks,
    /// The provider API failed midway
    Failed,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Created => "created",
            ExportStatus::Updated => "updated",
            ExportStatus::NoNewTracks => "unchanged",
            ExportStatus::NoTracks => "empty",
            ExportStatus::Failed => "failed",
        }
    }
}

/// A playlist waiting for the visitor's consent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExport {
    pub provider: Provider,
    pub name: String,
    /// Provider track ids, newest first
    pub tracks: Vec<String>,
    pub referer: Url,
    pub created_at: DateTime<Utc>,
}

impl PendingExport {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::minutes(PENDING_EXPORT_TTL_MINUTES)
    }
}

/// Pending exports keyed by OAuth `state`
#[derive(Clone, Default)]
pub struct PendingExports {
    inner: Arc<RwLock<HashMap<String, PendingExport>>>,
}

impl PendingExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an export and return its state token; expired entries are purged
    pub async fn insert(&self, export: PendingExport, now: DateTime<Utc>) -> String {
        let state = Uuid::new_v4().to_string();
        let mut pending = self.inner.write().await;
        pending.retain(|_, p| !p.is_expired(now));
        pending.insert(state.clone(), export);
        state
    }

    /// Remove and return the export for `state` unless it has expired
    pub async fn take(&self, state: &str, now: DateTime<Utc>) -> Option<PendingExport> {
        let export = self.inner.write().await.remove(state)?;
        (!export.is_expired(now)).then_some(export)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub struct ExportService {
    store: Arc<dyn TrackStore>,
    services: HashMap<Provider, Arc<dyn PlaylistService>>,
    pending: PendingExports,
    public_url: Url,
    playlist_prefix: String,
}

impl ExportService {
    pub fn new(
        store: Arc<dyn TrackStore>,
        services: Vec<Arc<dyn PlaylistService>>,
        public_url: Url,
        playlist_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            services: services.into_iter().map(|s| (s.provider(), s)).collect(),
            pending: PendingExports::new(),
            public_url,
            playlist_prefix: playlist_prefix.into(),
        }
    }

    pub fn pending(&self) -> &PendingExports {
        &self.pending
    }

    /// Providers with a configured playlist service
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.services.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }

    fn service(&self, provider: Provider) -> Result<&Arc<dyn PlaylistService>> {
        self.services.get(&provider).ok_or_else(|| {
            TimeuhError::invalid_input(format!("{} export is not configured", provider))
        })
    }

    /// Where the provider sends the visitor back to
    pub fn redirect_uri(&self, provider: Provider) -> Result<String> {
        self.site_url(&format!("/finalize/playlist/{}", provider))
            .map(String::from)
    }

    fn site_url(&self, path: &str) -> Result<Url> {
        self.public_url
            .join(path)
            .map_err(|e| TimeuhError::config(format!("Invalid site path '{}': {}", path, e)))
    }

    fn home(&self) -> Result<String> {
        self.site_url("/").map(String::from)
    }

    /// Resolve the referer against the site; foreign origins fall back to the
    /// archives page.
    pub fn safe_referer(&self, referer: Option<&str>) -> Result<Url> {
        let own = referer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .and_then(|r| self.public_url.join(r).ok())
            .filter(|url| url.origin() == self.public_url.origin());

        match own {
            Some(url) => Ok(url),
            None => self.site_url("/archives"),
        }
    }

    /// Start an export: returns the URL to redirect the visitor to
    pub async fn initiate(
        &self,
        provider: Provider,
        year: i32,
        month: u32,
        day: Option<u32>,
        referer: Option<&str>,
    ) -> Result<String> {
        let period = ExportPeriod::from_parts(year, month, day)?;
        let service = self.service(provider)?;
        let referer = self.safe_referer(referer)?;
        let name = period.playlist_name(&self.playlist_prefix);

        let tracks = self.store.find_provider_links(provider, period).await?;
        if tracks.is_empty() {
            tracing::info!(%provider, name = %name, "No tracks to export");
            return Ok(flash(referer, ExportStatus::NoTracks, &name));
        }

        let count = tracks.len();
        let state = self
            .pending
            .insert(
                PendingExport {
                    provider,
                    name: name.clone(),
                    tracks,
                    referer,
                    created_at: Utc::now(),
                },
                Utc::now(),
            )
            .await;

        tracing::info!(%provider, name = %name, tracks = count, "Export pending authorization");

        service.authorize_url(&self.redirect_uri(provider)?, &state)
    }

    /// Complete an export after the provider redirected back: returns the
    /// URL to redirect the visitor to
    pub async fn finalize(
        &self,
        provider: Provider,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<String> {
        let Some(state) = state else {
            tracing::warn!(%provider, "Authorization callback without state");
            return self.home();
        };
        let Some(export) = self.pending.take(state, Utc::now()).await else {
            tracing::warn!(%provider, "Unknown or expired export state");
            return self.home();
        };
        if export.provider != provider {
            tracing::warn!(%provider, expected = %export.provider, "Export provider mismatch");
            return self.home();
        }
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            tracing::info!(%provider, "Authorization declined");
            return self.home();
        };
        let Ok(service) = self.service(provider) else {
            return self.home();
        };

        let token = match service.exchange_code(code, &self.redirect_uri(provider)?).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(%provider, error = %e, "Token exchange failed");
                return self.home();
            }
        };

        let status = match write_playlist(service.as_ref(), &token, &export).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    %provider,
                    name = %export.name,
                    error = %e,
                    "Playlist export failed"
                );
                ExportStatus::Failed
            }
        };

        tracing::info!(%provider, name = %export.name, status = status.as_str(), "Export finished");

        Ok(flash(export.referer, status, &export.name))
    }
}

/// Create or update the playlist named after the export
async fn write_playlist(
    service: &dyn PlaylistService,
    token: &AccessToken,
    export: &PendingExport,
) -> Result<ExportStatus> {
    let existing = service
        .user_playlists(token)
        .await?
        .into_iter()
        .find(|p| p.name == export.name);

    let (playlist_id, tracks, status) = match existing {
        Some(playlist) => {
            let present: HashSet<String> = service
                .playlist_track_ids(token, &playlist.id)
                .await?
                .into_iter()
                .collect();
            let missing: Vec<String> = export
                .tracks
                .iter()
                .filter(|t| !present.contains(*t))
                .cloned()
                .collect();

            if missing.is_empty() {
                return Ok(ExportStatus::NoNewTracks);
            }
            (playlist.id, missing, ExportStatus::Updated)
        }
        None => {
            let created = service.create_playlist(token, &export.name).await?;
            (created.id, export.tracks.clone(), ExportStatus::Created)
        }
    };

    for batch in tracks.chunks(ADD_BATCH_SIZE) {
        service.add_tracks(token, &playlist_id, batch).await?;
    }

    Ok(status)
}

/// Append the export outcome to the page the visitor returns to
fn flash(mut referer: Url, status: ExportStatus, name: &str) -> String {
    referer
        .query_pairs_mut()
        .append_pair("export", status.as_str())
        .append_pair("playlist", name);
    referer.into()
}
