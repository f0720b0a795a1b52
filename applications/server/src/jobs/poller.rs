/// In-process scheduler for ingestion and archive refreshes
use crate::services::{ArchiveService, IngestOutcome, IngestService};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use timeuh_core::schedule;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub struct Poller {
    ingest: Arc<IngestService>,
    archives: Arc<ArchiveService>,
    timezone: Tz,
    poll_interval: Duration,
    archives_interval: Duration,
}

impl Poller {
    pub fn new(
        ingest: Arc<IngestService>,
        archives: Arc<ArchiveService>,
        timezone: Tz,
        poll_interval: Duration,
        archives_interval: Duration,
    ) -> Self {
        Self {
            ingest,
            archives,
            timezone,
            poll_interval,
            archives_interval,
        }
    }

    /// Spawn both loops; they run until the runtime shuts down
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let ingest = Arc::clone(&self);
        let archives = self;

        vec![
            tokio::spawn(async move {
                tracing::info!(every = ?ingest.poll_interval, "Feed poller started");
                ingest.ingest_loop().await;
            }),
            tokio::spawn(async move {
                tracing::info!(every = ?archives.archives_interval, "Archive refresher started");
                archives.archives_loop().await;
            }),
        ]
    }

    async fn ingest_loop(&self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    async fn archives_loop(&self) {
        let mut ticker = interval(self.archives_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }

    /// One feed poll; failures are logged and never stop the loop
    pub async fn poll_once(&self) -> Option<IngestOutcome> {
        match self.ingest.ingest_current().await {
            Ok(outcome) => {
                if let IngestOutcome::Success { inserted, skipped } = outcome {
                    if inserted > 0 {
                        tracing::info!(inserted, skipped, "Feed polled");
                    } else {
                        tracing::debug!(skipped, "Feed polled, nothing new");
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "Feed poll failed");
                None
            }
        }
    }

    /// One refresh of the current archive periods
    pub async fn refresh_once(&self) -> Option<usize> {
        let today = schedule::station_now(self.timezone).date();
        match self.archives.update_current(today).await {
            Ok(slices) => Some(slices),
            Err(e) => {
                tracing::error!(error = %e, "Archive refresh failed");
                None
            }
        }
    }
}
