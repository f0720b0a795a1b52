//! Storage trait for the track history

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::types::{
    ArchiveView, CreateTrack, ExportPeriod, Highlight, HighlightRefresh, MissingLinks, Provider,
    Track, TrackId, UpdateTrackLinks,
};

/// Number of minutes a track is considered "currently playing" after it started
pub const CURRENTLY_PLAYING_WINDOW_MINUTES: i64 = 30;

/// Storage context providing access to the track history
///
/// Every date-time handled here is the station's local wall-clock time.
#[async_trait]
pub trait TrackStore: Send + Sync {
    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Whether a track starting exactly at `started_at` is already recorded
    async fn exists_started_at(&self, started_at: NaiveDateTime) -> Result<bool>;

    /// Record a new track
    async fn insert_track(&self, track: CreateTrack) -> Result<Track>;

    /// Fill in link columns of a stored track
    async fn update_track_links(&self, id: TrackId, update: UpdateTrackLinks) -> Result<Track>;

    /// Valid tracks still lacking some enrichment, newest first
    async fn find_missing(
        &self,
        kind: MissingLinks,
        started_after: Option<NaiveDateTime>,
    ) -> Result<Vec<Track>>;

    // ========================================================================
    // Browsing
    // ========================================================================

    /// Latest valid track started within the last
    /// [`CURRENTLY_PLAYING_WINDOW_MINUTES`] before `now`
    async fn find_currently_playing(&self, now: NaiveDateTime) -> Result<Option<Track>>;

    /// One page (1-based) of valid tracks, newest first, skipping `except`
    async fn find_latest_page(
        &self,
        per_page: u32,
        except: Option<TrackId>,
        page: u32,
    ) -> Result<Vec<Track>>;

    /// Valid tracks with a cover played on `date`, newest first
    async fn find_by_day(&self, date: NaiveDate) -> Result<Vec<Track>>;

    /// Number of valid tracks with a cover played during a month
    async fn count_by_month(&self, year: i32, month: u32) -> Result<u64>;

    /// Provider identifiers of the valid tracks of a period, newest first
    async fn find_provider_links(
        &self,
        provider: Provider,
        period: ExportPeriod,
    ) -> Result<Vec<String>>;

    // ========================================================================
    // Archives
    // ========================================================================

    /// Rebuild one slice of the archive highlights
    async fn refresh_highlights(&self, refresh: HighlightRefresh) -> Result<()>;

    /// Highlights of one archive level, newest period first
    async fn highlights(&self, view: ArchiveView) -> Result<Vec<Highlight>>;
}
