//! Archive highlight maintenance
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use timeuh_core::{HighlightRefresh, Result, TrackStore};

pub struct ArchiveService {
    store: Arc<dyn TrackStore>,
    starting_year: i32,
}

impl ArchiveService {
    pub fn new(store: Arc<dyn TrackStore>, starting_year: i32) -> Self {
        Self {
            store,
            starting_year,
        }
    }

    /// Refresh the periods still changing: the current year, its months and
    /// the days of the current month. Returns the number of slices rebuilt.
    pub async fn update_current(&self, today: NaiveDate) -> Result<usize> {
        let refreshes = [
            HighlightRefresh::Year(today.year()),
            HighlightRefresh::Months(today.year()),
            HighlightRefresh::Days {
                year: today.year(),
                month: today.month(),
            },
        ];

        self.run(&refreshes).await
    }

    /// Rebuild everything from the starting year up to the current one
    pub async fn update_all_time(&self, today: NaiveDate) -> Result<usize> {
        let mut refreshes = Vec::new();
        for year in self.starting_year..=today.year() {
            refreshes.push(HighlightRefresh::Year(year));
            refreshes.push(HighlightRefresh::Months(year));
            refreshes.extend((1..=12).map(|month| HighlightRefresh::Days { year, month }));
        }

        self.run(&refreshes).await
    }

    async fn run(&self, refreshes: &[HighlightRefresh]) -> Result<usize> {
        for refresh in refreshes {
            self.store.refresh_highlights(*refresh).await?;
        }
        tracing::info!(slices = refreshes.len(), "Archive highlights updated");
        Ok(refreshes.len())
    }
}
