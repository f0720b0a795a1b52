use crate::{highlights, tracks};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use timeuh_core::{error::Result, storage::TrackStore, types::*};

/// Track history backed by `SQLite`
#[derive(Clone)]
pub struct SqliteTrackStore {
    pool: SqlitePool,
    highlights_per_period: u32,
}

impl SqliteTrackStore {
    pub fn new(pool: SqlitePool, highlights_per_period: u32) -> Self {
        Self {
            pool,
            highlights_per_period,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TrackStore for SqliteTrackStore {
    // Ingestion
    async fn exists_started_at(&self, started_at: NaiveDateTime) -> Result<bool> {
        tracks::exists_started_at(&self.pool, started_at).await
    }

    async fn insert_track(&self, track: CreateTrack) -> Result<Track> {
        tracks::insert(&self.pool, track).await
    }

    async fn update_track_links(&self, id: TrackId, update: UpdateTrackLinks) -> Result<Track> {
        tracks::update_links(&self.pool, id, update).await
    }

    async fn find_missing(
        &self,
        kind: MissingLinks,
        started_after: Option<NaiveDateTime>,
    ) -> Result<Vec<Track>> {
        tracks::find_missing(&self.pool, kind, started_after).await
    }

    // Browsing
    async fn find_currently_playing(&self, now: NaiveDateTime) -> Result<Option<Track>> {
        tracks::find_currently_playing(&self.pool, now).await
    }

    async fn find_latest_page(
        &self,
        per_page: u32,
        except: Option<TrackId>,
        page: u32,
    ) -> Result<Vec<Track>> {
        tracks::find_latest_page(&self.pool, per_page, except, page).await
    }

    async fn find_by_day(&self, date: NaiveDate) -> Result<Vec<Track>> {
        tracks::find_by_day(&self.pool, date).await
    }

    async fn count_by_month(&self, year: i32, month: u32) -> Result<u64> {
        tracks::count_by_month(&self.pool, year, month).await
    }

    async fn find_provider_links(
        &self,
        provider: Provider,
        period: ExportPeriod,
    ) -> Result<Vec<String>> {
        tracks::find_provider_links(&self.pool, provider, period).await
    }

    // Archives
    async fn refresh_highlights(&self, refresh: HighlightRefresh) -> Result<()> {
        highlights::refresh(&self.pool, refresh, self.highlights_per_period).await
    }

    async fn highlights(&self, view: ArchiveView) -> Result<Vec<Highlight>> {
        highlights::list(&self.pool, view).await
    }
}
