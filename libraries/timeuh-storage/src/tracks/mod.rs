use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use timeuh_core::storage::CURRENTLY_PLAYING_WINDOW_MINUTES;
use timeuh_core::{
    error::Result, CreateTrack, ExportPeriod, MissingLinks, Provider, TimeuhError, Track,
    TrackId, UpdateTrackLinks,
};

use crate::error::StorageError;
use crate::period;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRACK_COLUMNS: &str = "id, title, album, artist, image, started_at, tuneefy_link, \
                             spotify_link, deezer_link, valid, created_at";

/// Archive listings only show tracks with artwork
const HAS_COVER: &str = "image IS NOT NULL AND image != ''";

pub(crate) fn format_local(at: NaiveDateTime) -> String {
    at.format(LOCAL_FORMAT).to_string()
}

fn parse_local(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_FORMAT)
        .map_err(|e| TimeuhError::storage(format!("Invalid started_at '{}': {}", value, e)))
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TimeuhError::storage(format!("Invalid created_at '{}': {}", value, e)))
}

/// Empty strings are stored as NULL
fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

pub(crate) fn from_row(row: &SqliteRow) -> Result<Track> {
    let started_at: String = row.try_get("started_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Track {
        id: TrackId::new(row.try_get("id")?),
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        album: row.try_get("album")?,
        artist: row.try_get("artist")?,
        image: row.try_get("image")?,
        started_at: parse_local(&started_at)?,
        tuneefy_link: row.try_get("tuneefy_link")?,
        spotify_link: row.try_get("spotify_link")?,
        deezer_link: row.try_get("deezer_link")?,
        valid: row.try_get::<i64, _>("valid")? != 0,
        created_at: parse_utc(&created_at)?,
    })
}

fn from_rows(rows: Vec<SqliteRow>) -> Result<Vec<Track>> {
    rows.iter().map(from_row).collect()
}

pub async fn exists_started_at(pool: &SqlitePool, started_at: NaiveDateTime) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE started_at = ?")
        .bind(format_local(started_at))
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn get_by_id(pool: &SqlitePool, id: TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS))
        .bind(id.get())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, track: CreateTrack) -> Result<Track> {
    let started_at = format_local(track.started_at);

    let result = sqlx::query(
        "INSERT INTO tracks (title, album, artist, image, started_at, tuneefy_link,
                             spotify_link, deezer_link, valid, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(non_empty(&track.title))
    .bind(non_empty(&track.album))
    .bind(non_empty(&track.artist))
    .bind(non_empty(&track.image))
    .bind(&started_at)
    .bind(track.tuneefy_link.as_deref().and_then(non_empty))
    .bind(track.spotify_link.as_deref().and_then(non_empty))
    .bind(track.deezer_link.as_deref().and_then(non_empty))
    .bind(i64::from(track.valid))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::DuplicateStart(started_at.clone()),
        _ => StorageError::Database(e),
    })?;

    let id = TrackId::new(result.last_insert_rowid());

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| TimeuhError::storage("Failed to retrieve created track"))
}

/// Columns left as `None` in `update` keep their current value.
pub async fn update_links(
    pool: &SqlitePool,
    id: TrackId,
    update: UpdateTrackLinks,
) -> Result<Track> {
    let result = sqlx::query(
        "UPDATE tracks
         SET tuneefy_link = COALESCE(?, tuneefy_link),
             spotify_link = COALESCE(?, spotify_link),
             deezer_link = COALESCE(?, deezer_link),
             image = COALESCE(?, image)
         WHERE id = ?",
    )
    .bind(update.tuneefy_link.as_deref().and_then(non_empty))
    .bind(update.spotify_link.as_deref().and_then(non_empty))
    .bind(update.deezer_link.as_deref().and_then(non_empty))
    .bind(update.image.as_deref().and_then(non_empty))
    .bind(id.get())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(TimeuhError::TrackNotFound(id));
    }

    get_by_id(pool, id)
        .await?
        .ok_or(TimeuhError::TrackNotFound(id))
}

pub async fn find_missing(
    pool: &SqlitePool,
    kind: MissingLinks,
    started_after: Option<NaiveDateTime>,
) -> Result<Vec<Track>> {
    let missing = match kind {
        MissingLinks::Tuneefy => "tuneefy_link IS NULL",
        MissingLinks::Spotify => "tuneefy_link IS NOT NULL AND spotify_link IS NULL",
        MissingLinks::Deezer => "tuneefy_link IS NOT NULL AND deezer_link IS NULL",
    };
    let after = if started_after.is_some() {
        " AND started_at > ?"
    } else {
        ""
    };

    let sql = format!(
        "SELECT {} FROM tracks WHERE valid = 1 AND {}{} ORDER BY started_at DESC",
        TRACK_COLUMNS, missing, after
    );

    let mut query = sqlx::query(&sql);
    if let Some(after) = started_after {
        query = query.bind(format_local(after));
    }

    from_rows(query.fetch_all(pool).await?)
}

pub async fn find_currently_playing(
    pool: &SqlitePool,
    now: NaiveDateTime,
) -> Result<Option<Track>> {
    let since = now - Duration::minutes(CURRENTLY_PLAYING_WINDOW_MINUTES);

    let row = sqlx::query(&format!(
        "SELECT {} FROM tracks
         WHERE valid = 1 AND started_at > ? AND started_at <= ?
         ORDER BY started_at DESC
         LIMIT 1",
        TRACK_COLUMNS
    ))
    .bind(format_local(since))
    .bind(format_local(now))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn find_latest_page(
    pool: &SqlitePool,
    per_page: u32,
    except: Option<TrackId>,
    page: u32,
) -> Result<Vec<Track>> {
    let offset = i64::from(page.max(1) - 1) * i64::from(per_page);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM tracks
         WHERE valid = 1 AND id != ?
         ORDER BY started_at DESC
         LIMIT ? OFFSET ?",
        TRACK_COLUMNS
    ))
    .bind(except.map_or(-1, |id| id.get()))
    .bind(i64::from(per_page))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    from_rows(rows)
}

async fn find_between(
    pool: &SqlitePool,
    (start, end): (NaiveDateTime, NaiveDateTime),
) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM tracks
         WHERE valid = 1 AND {} AND started_at >= ? AND started_at < ?
         ORDER BY started_at DESC",
        TRACK_COLUMNS, HAS_COVER
    ))
    .bind(format_local(start))
    .bind(format_local(end))
    .fetch_all(pool)
    .await?;

    from_rows(rows)
}

pub async fn find_by_day(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Track>> {
    find_between(pool, period::day(date)?).await
}

pub async fn find_by_month(pool: &SqlitePool, year: i32, month: u32) -> Result<Vec<Track>> {
    find_between(pool, period::month(year, month)?).await
}

/// Size of [`find_by_month`] without loading the rows
pub async fn count_by_month(pool: &SqlitePool, year: i32, month: u32) -> Result<u64> {
    let (start, end) = period::month(year, month)?;

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM tracks
         WHERE valid = 1 AND {} AND started_at >= ? AND started_at < ?",
        HAS_COVER
    ))
    .bind(format_local(start))
    .bind(format_local(end))
    .fetch_one(pool)
    .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Provider identifiers of the period's valid tracks; tracks without one are
/// skipped and duplicates keep their most recent position.
pub async fn find_provider_links(
    pool: &SqlitePool,
    provider: Provider,
    period: ExportPeriod,
) -> Result<Vec<String>> {
    let (start, end) = match period {
        ExportPeriod::Day(date) => period::day(date)?,
        ExportPeriod::Month { year, month } => period::month(year, month)?,
    };

    // link_column() is one of two fixed column names
    let column = provider.link_column();
    let links: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT {column} FROM tracks
         WHERE valid = 1 AND {column} IS NOT NULL AND {column} != ''
           AND started_at >= ? AND started_at < ?
         ORDER BY started_at DESC",
    ))
    .bind(format_local(start))
    .bind(format_local(end))
    .fetch_all(pool)
    .await?;

    let mut seen = std::collections::HashSet::new();
    Ok(links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect())
}

pub async fn find_provider_links_for_day(
    pool: &SqlitePool,
    provider: Provider,
    date: NaiveDate,
) -> Result<Vec<String>> {
    find_provider_links(pool, provider, ExportPeriod::Day(date)).await
}

pub async fn find_provider_links_for_month(
    pool: &SqlitePool,
    provider: Provider,
    year: i32,
    month: u32,
) -> Result<Vec<String>> {
    find_provider_links(pool, provider, ExportPeriod::Month { year, month }).await
}
