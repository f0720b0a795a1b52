//! Archive highlights
//!
//! Each archive period (year, month of a year, day of a month) is illustrated
//! by a handful of its tracks. A period's highlights are its most-played
//! songs, ties broken by the latest broadcast, counting only valid tracks
//! with a cover. Plays are grouped on the case-insensitive title and artist.

use sqlx::{Row, SqlitePool};
use timeuh_core::{error::Result, ArchiveView, Highlight, HighlightRefresh, TrackId};

use crate::period;
use crate::tracks::format_local;

/// Table and key layout of one highlight level
struct Level {
    table: &'static str,
    /// Key columns, in insertion order
    columns: &'static str,
    /// Placeholders for the fixed leading keys
    fixed: &'static str,
    /// Expression deriving the varying key from `started_at`, if any
    bucket: Option<&'static str>,
}

impl Level {
    fn for_refresh(refresh: HighlightRefresh) -> Self {
        match refresh {
            HighlightRefresh::Year(_) => Level {
                table: "year_highlights",
                columns: "year",
                fixed: "?,",
                bucket: None,
            },
            HighlightRefresh::Months(_) => Level {
                table: "month_highlights",
                columns: "year, month",
                fixed: "?,",
                bucket: Some("CAST(strftime('%m', started_at) AS INTEGER)"),
            },
            HighlightRefresh::Days { .. } => Level {
                table: "day_highlights",
                columns: "year, month, day",
                fixed: "?, ?,",
                bucket: Some("CAST(strftime('%d', started_at) AS INTEGER)"),
            },
        }
    }

    fn delete_sql(&self, fixed_keys: usize) -> String {
        let filter = ["year = ?", "month = ?"][..fixed_keys].join(" AND ");
        format!("DELETE FROM {} WHERE {}", self.table, filter)
    }

    fn insert_sql(&self) -> String {
        let (bucket_select, bucket_col, partition) = match self.bucket {
            Some(expr) => (
                format!("{} AS bucket,", expr),
                "bucket,",
                "PARTITION BY bucket",
            ),
            None => (String::new(), "", ""),
        };

        format!(
            "WITH plays AS (
                 SELECT {bucket_select}
                        id AS track_id,
                        COUNT(*) AS play_count,
                        MAX(started_at) AS last_played
                 FROM tracks
                 WHERE valid = 1 AND image IS NOT NULL AND image != ''
                   AND started_at >= ? AND started_at < ?
                 GROUP BY {bucket_col} lower(title), lower(coalesce(artist, ''))
             ),
             ranked AS (
                 SELECT {bucket_col} track_id,
                        ROW_NUMBER() OVER (
                            {partition} ORDER BY play_count DESC, last_played DESC
                        ) AS position
                 FROM plays
             )
             INSERT INTO {table} ({columns}, position, track_id)
             SELECT {fixed} {bucket_col} position, track_id
             FROM ranked
             WHERE position <= ?",
            table = self.table,
            columns = self.columns,
            fixed = self.fixed,
        )
    }
}

/// Rebuild one slice of highlights, keeping at most `per_period` per period.
pub async fn refresh(pool: &SqlitePool, refresh: HighlightRefresh, per_period: u32) -> Result<()> {
    let level = Level::for_refresh(refresh);
    let (keys, (start, end)): (Vec<i64>, _) = match refresh {
        HighlightRefresh::Year(year) | HighlightRefresh::Months(year) => {
            (vec![i64::from(year)], period::year(year)?)
        }
        HighlightRefresh::Days { year, month } => (
            vec![i64::from(year), i64::from(month)],
            period::month(year, month)?,
        ),
    };

    let mut tx = pool.begin().await?;

    let delete_sql = level.delete_sql(keys.len());
    let mut delete = sqlx::query(&delete_sql);
    for key in &keys {
        delete = delete.bind(key);
    }
    delete.execute(&mut *tx).await?;

    let insert_sql = level.insert_sql();
    let mut insert = sqlx::query(&insert_sql)
        .bind(format_local(start))
        .bind(format_local(end));
    for key in &keys {
        insert = insert.bind(key);
    }
    let inserted = insert
        .bind(i64::from(per_period))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    tracing::debug!(?refresh, inserted, "Refreshed archive highlights");

    Ok(())
}

pub async fn refresh_years(pool: &SqlitePool, year: i32, per_period: u32) -> Result<()> {
    refresh(pool, HighlightRefresh::Year(year), per_period).await
}

pub async fn refresh_months(pool: &SqlitePool, year: i32, per_period: u32) -> Result<()> {
    refresh(pool, HighlightRefresh::Months(year), per_period).await
}

pub async fn refresh_days(pool: &SqlitePool, year: i32, month: u32, per_period: u32) -> Result<()> {
    refresh(pool, HighlightRefresh::Days { year, month }, per_period).await
}

pub async fn years(pool: &SqlitePool) -> Result<Vec<Highlight>> {
    list(pool, ArchiveView::Years).await
}

pub async fn months(pool: &SqlitePool, year: i32) -> Result<Vec<Highlight>> {
    list(pool, ArchiveView::Months { year }).await
}

pub async fn days(pool: &SqlitePool, year: i32, month: u32) -> Result<Vec<Highlight>> {
    list(pool, ArchiveView::Days { year, month }).await
}

/// Highlights of one archive level, newest period first then by rank
pub async fn list(pool: &SqlitePool, view: ArchiveView) -> Result<Vec<Highlight>> {
    const TRACK: &str = "t.id, t.title, t.album, t.artist, t.image";

    let rows = match view {
        ArchiveView::Years => {
            sqlx::query(&format!(
                "SELECT h.year, NULL AS month, NULL AS day, {TRACK}
                 FROM year_highlights h
                 JOIN tracks t ON t.id = h.track_id
                 ORDER BY h.year DESC, h.position"
            ))
            .fetch_all(pool)
            .await?
        }
        ArchiveView::Months { year } => {
            sqlx::query(&format!(
                "SELECT h.year, h.month, NULL AS day, {TRACK}
                 FROM month_highlights h
                 JOIN tracks t ON t.id = h.track_id
                 WHERE h.year = ?
                 ORDER BY h.month DESC, h.position"
            ))
            .bind(year)
            .fetch_all(pool)
            .await?
        }
        ArchiveView::Days { year, month } => {
            sqlx::query(&format!(
                "SELECT h.year, h.month, h.day, {TRACK}
                 FROM day_highlights h
                 JOIN tracks t ON t.id = h.track_id
                 WHERE h.year = ? AND h.month = ?
                 ORDER BY h.day DESC, h.position"
            ))
            .bind(year)
            .bind(month)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter()
        .map(|row| {
            Ok(Highlight {
                track_id: TrackId::new(row.try_get("id")?),
                title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
                album: row.try_get("album")?,
                artist: row.try_get("artist")?,
                image: row.try_get("image")?,
                year: row.try_get("year")?,
                month: row.try_get::<Option<i64>, _>("month")?.map(|m| m as u32),
                day: row.try_get::<Option<i64>, _>("day")?.map(|d| d as u32),
            })
        })
        .collect()
}
