//! Now-playing ingestion
//!
//! Each poll of the feed returns the current track and the few before it, so
//! most entries were already recorded by a previous poll. The start time is
//! the deduplication key.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::Arc;
use timeuh_core::{
    classify::{Classifier, Validity},
    schedule, CreateTrack, FeedEntry, LinkResolver, NowPlayingSource, Result, TimeuhError,
    TrackStore,
};

/// Result of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The feed was read; `skipped` entries were already known
    Success { inserted: usize, skipped: usize },
    /// The feed could not be reached
    Failure,
    /// The feed answered with something unreadable
    BadResponse,
}

pub struct IngestService {
    source: Arc<dyn NowPlayingSource>,
    resolver: Arc<dyn LinkResolver>,
    store: Arc<dyn TrackStore>,
    classifier: Classifier,
    timezone: Tz,
}

impl IngestService {
    pub fn new(
        source: Arc<dyn NowPlayingSource>,
        resolver: Arc<dyn LinkResolver>,
        store: Arc<dyn TrackStore>,
        classifier: Classifier,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            resolver,
            store,
            classifier,
            timezone,
        }
    }

    /// Poll the feed and record the tracks not seen yet
    pub async fn ingest_current(&self) -> Result<IngestOutcome> {
        self.ingest_at(schedule::station_now(self.timezone)).await
    }

    /// Same as [`Self::ingest_current`] with an explicit station-local "now"
    pub async fn ingest_at(&self, now: NaiveDateTime) -> Result<IngestOutcome> {
        let entries = match self.source.fetch().await {
            Ok(entries) => entries,
            Err(TimeuhError::BadResponse(msg)) => {
                tracing::warn!(error = %msg, "Now-playing feed returned a bad response");
                return Ok(IngestOutcome::BadResponse);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch the now-playing feed");
                return Ok(IngestOutcome::Failure);
            }
        };

        let mut seen = HashSet::new();
        let mut inserted = 0;
        let mut skipped = 0;

        for entry in entries {
            let clock = match schedule::parse_clock(&entry.time) {
                Ok(clock) => clock,
                Err(e) => {
                    tracing::warn!(error = %e, title = %entry.title, "Skipping feed entry");
                    skipped += 1;
                    continue;
                }
            };
            let started_at = schedule::resolve_started_at(clock, now);

            if !seen.insert(started_at) || self.store.exists_started_at(started_at).await? {
                skipped += 1;
                continue;
            }

            let track = self.prepare(entry, started_at).await;
            let track = match self.store.insert_track(track).await {
                Ok(track) => track,
                // Another writer recorded it since the lookup above
                Err(TimeuhError::DuplicateStart(at)) => {
                    tracing::debug!(started_at = %at, "Track recorded concurrently");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                id = %track.id,
                started_at = %track.started_at,
                title = %track.title,
                artist = track.artist.as_deref().unwrap_or(""),
                valid = track.valid,
                "Recorded track"
            );
            inserted += 1;
        }

        Ok(IngestOutcome::Success { inserted, skipped })
    }

    /// Classify, enrich and clean one entry
    async fn prepare(&self, entry: FeedEntry, started_at: NaiveDateTime) -> CreateTrack {
        let mut track = CreateTrack::new(
            &entry.title,
            entry.album.as_deref().unwrap_or_default(),
            entry.artist.as_deref().unwrap_or_default(),
            entry.image.as_deref().unwrap_or_default(),
            started_at,
        );

        match self.classifier.classify(&track) {
            Validity::Valid => {
                track.valid = true;
                match self.resolver.resolve(&track.title, &track.artist).await {
                    Ok(Some(links)) => track.apply_links(links),
                    Ok(None) => {
                        tracing::debug!(title = %track.title, "No links found");
                    }
                    // Stored without links, `fetch-tracks --fix-missing` retries later
                    Err(e) => {
                        tracing::warn!(error = %e, title = %track.title, "Link resolution failed");
                    }
                }
            }
            Validity::Invalid(reason) => {
                tracing::debug!(title = %track.title, reason = %reason, "Not a song");
            }
        }

        track.clean();
        track
    }
}
