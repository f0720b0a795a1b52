//! Common test utilities and fixtures
//!
//! Services run against a REAL SQLite file in a temp directory; external
//! collaborators are replaced by the in-memory fakes below.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use timeuh_core::{
    AccessToken, CreateTrack, FeedEntry, LinkResolver, NowPlayingSource, PlaylistService,
    PlaylistSummary, Provider, ProviderLinks, ResolvedLinks, Result, TimeuhError, Track,
    TrackStore,
};
use timeuh_core::types::{
    ArchiveView, ExportPeriod, Highlight, HighlightRefresh, MissingLinks, TrackId,
    UpdateTrackLinks,
};
use timeuh_storage::SqliteTrackStore;

pub const PUBLIC_URL: &str = "https://timeuh.example";

/// Track store backed by a temporary SQLite file
pub struct TestStore {
    pub store: Arc<SqliteTrackStore>,
    _temp_dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let pool = timeuh_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");
        timeuh_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            store: Arc::new(SqliteTrackStore::new(pool, 4)),
            _temp_dir: temp_dir,
        }
    }

    pub fn dyn_store(&self) -> Arc<dyn TrackStore> {
        Arc::clone(&self.store) as Arc<dyn TrackStore>
    }
}

/// Local date-time shorthand
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn entry(time: &str, title: &str, album: &str, artist: &str) -> FeedEntry {
    FeedEntry {
        time: time.to_string(),
        title: title.to_string(),
        album: Some(album.to_string()),
        artist: Some(artist.to_string()),
        image: Some("https://feed.example/cover.jpg".to_string()),
    }
}

/// Record a valid song with a cover and the given provider links
pub async fn insert_song(
    store: &TestStore,
    title: &str,
    started_at: NaiveDateTime,
    spotify: Option<&str>,
    deezer: Option<&str>,
) -> Track {
    let mut track = CreateTrack::new(title, "Album", "Artist", "https://img/cover.jpg", started_at);
    track.valid = true;
    track.tuneefy_link = Some(format!("https://tuneefy.com/t/{}", title.to_lowercase()));
    track.spotify_link = spotify.map(str::to_string);
    track.deezer_link = deezer.map(str::to_string);
    store
        .store
        .insert_track(track)
        .await
        .expect("Failed to insert song")
}

/// Store whose existence check always misses, as when another writer records
/// a track between the check and the insert
pub struct RacingStore(pub Arc<dyn TrackStore>);

#[async_trait]
impl TrackStore for RacingStore {
    async fn exists_started_at(&self, _started_at: NaiveDateTime) -> Result<bool> {
        Ok(false)
    }

    async fn insert_track(&self, track: CreateTrack) -> Result<Track> {
        self.0.insert_track(track).await
    }

    async fn update_track_links(&self, id: TrackId, update: UpdateTrackLinks) -> Result<Track> {
        self.0.update_track_links(id, update).await
    }

    async fn find_missing(
        &self,
        kind: MissingLinks,
        started_after: Option<NaiveDateTime>,
    ) -> Result<Vec<Track>> {
        self.0.find_missing(kind, started_after).await
    }

    async fn find_currently_playing(&self, now: NaiveDateTime) -> Result<Option<Track>> {
        self.0.find_currently_playing(now).await
    }

    async fn find_latest_page(
        &self,
        per_page: u32,
        except: Option<TrackId>,
        page: u32,
    ) -> Result<Vec<Track>> {
        self.0.find_latest_page(per_page, except, page).await
    }

    async fn find_by_day(&self, date: NaiveDate) -> Result<Vec<Track>> {
        self.0.find_by_day(date).await
    }

    async fn count_by_month(&self, year: i32, month: u32) -> Result<u64> {
        self.0.count_by_month(year, month).await
    }

    async fn find_provider_links(
        &self,
        provider: Provider,
        period: ExportPeriod,
    ) -> Result<Vec<String>> {
        self.0.find_provider_links(provider, period).await
    }

    async fn refresh_highlights(&self, refresh: HighlightRefresh) -> Result<()> {
        self.0.refresh_highlights(refresh).await
    }

    async fn highlights(&self, view: ArchiveView) -> Result<Vec<Highlight>> {
        self.0.highlights(view).await
    }
}

// =============================================================================
// Fakes
// =============================================================================

/// Feed returning a scripted answer
pub struct FakeFeed {
    answer: Mutex<std::result::Result<Vec<FeedEntry>, fn() -> TimeuhError>>,
}

impl FakeFeed {
    pub fn with(entries: Vec<FeedEntry>) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Ok(entries)),
        })
    }

    pub fn failing(error: fn() -> TimeuhError) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Err(error)),
        })
    }

    pub fn set(&self, entries: Vec<FeedEntry>) {
        *self.answer.lock().unwrap() = Ok(entries);
    }
}

#[async_trait]
impl NowPlayingSource for FakeFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>> {
        match &*self.answer.lock().unwrap() {
            Ok(entries) => Ok(entries.clone()),
            Err(error) => Err(error()),
        }
    }
}

/// Link resolver knowing a fixed set of titles
#[derive(Default)]
pub struct FakeResolver {
    pub known: HashMap<String, ResolvedLinks>,
    pub share_pages: HashMap<String, ProviderLinks>,
    /// Titles whose lookup fails with a network error
    pub broken: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn knows(mut self, title: &str, spotify: Option<&str>, deezer: Option<&str>) -> Self {
        self.known.insert(
            title.to_string(),
            ResolvedLinks {
                share_link: format!("https://tuneefy.com/t/{}", title.to_lowercase()),
                providers: ProviderLinks {
                    spotify: spotify.map(str::to_string),
                    deezer: deezer.map(str::to_string),
                },
                image: Some(format!("https://tuneefy.example/{}.jpg", title.to_lowercase())),
            },
        );
        self
    }

    pub fn share_page(mut self, link: &str, spotify: Option<&str>, deezer: Option<&str>) -> Self {
        self.share_pages.insert(
            link.to_string(),
            ProviderLinks {
                spotify: spotify.map(str::to_string),
                deezer: deezer.map(str::to_string),
            },
        );
        self
    }

    pub fn broken(mut self, title: &str) -> Self {
        self.broken.push(title.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkResolver for FakeResolver {
    async fn resolve(&self, title: &str, _artist: &str) -> Result<Option<ResolvedLinks>> {
        self.calls.lock().unwrap().push(title.to_string());
        if self.broken.iter().any(|b| b == title) {
            return Err(TimeuhError::network("connection reset"));
        }
        Ok(self.known.get(title).cloned())
    }

    async fn links_for_share_page(&self, share_link: &str) -> Result<ProviderLinks> {
        Ok(self.share_pages.get(share_link).cloned().unwrap_or_default())
    }
}

/// Playlist service keeping playlists in memory
pub struct FakePlaylists {
    provider: Provider,
    pub playlists: Mutex<Vec<(PlaylistSummary, Vec<String>)>>,
    /// Every `add_tracks` call, in order
    pub batches: Mutex<Vec<Vec<String>>>,
    /// Fail track additions with an API error
    pub fail_adds: bool,
}

impl FakePlaylists {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            playlists: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            fail_adds: false,
        }
    }

    pub fn with_playlist(self, id: &str, name: &str, tracks: &[&str]) -> Self {
        self.playlists.lock().unwrap().push((
            PlaylistSummary {
                id: id.to_string(),
                name: name.to_string(),
            },
            tracks.iter().map(|t| t.to_string()).collect(),
        ));
        self
    }

    pub fn tracks_of(&self, name: &str) -> Option<Vec<String>> {
        self.playlists
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.name == name)
            .map(|(_, tracks)| tracks.clone())
    }
}

#[async_trait]
impl PlaylistService for FakePlaylists {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String> {
        let url = url::Url::parse_with_params(
            "https://provider.example/authorize",
            &[("redirect_uri", redirect_uri), ("state", state)],
        )
        .map_err(|e| TimeuhError::config(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<AccessToken> {
        if code == "good-code" {
            Ok(AccessToken::new("user-token", None))
        } else {
            Err(TimeuhError::authorization(self.provider, "Authorization code refused"))
        }
    }

    async fn user_playlists(&self, _token: &AccessToken) -> Result<Vec<PlaylistSummary>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn create_playlist(&self, _token: &AccessToken, name: &str) -> Result<PlaylistSummary> {
        let mut playlists = self.playlists.lock().unwrap();
        let summary = PlaylistSummary {
            id: format!("pl-{}", playlists.len() + 1),
            name: name.to_string(),
        };
        playlists.push((summary.clone(), Vec::new()));
        Ok(summary)
    }

    async fn playlist_track_ids(
        &self,
        _token: &AccessToken,
        playlist_id: &str,
    ) -> Result<Vec<String>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default())
    }

    async fn add_tracks(
        &self,
        _token: &AccessToken,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<()> {
        if self.fail_adds {
            return Err(TimeuhError::bad_response("quota exceeded"));
        }
        self.batches.lock().unwrap().push(track_ids.to_vec());
        if let Some((_, tracks)) = self
            .playlists
            .lock()
            .unwrap()
            .iter_mut()
            .find(|(p, _)| p.id == playlist_id)
        {
            tracks.extend_from_slice(track_ids);
        }
        Ok(())
    }
}
