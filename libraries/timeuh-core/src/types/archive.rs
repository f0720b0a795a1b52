/// Archive highlight types
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::types::TrackId;

/// Which level of the archive is being browsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveView {
    /// One group per year
    Years,
    /// One group per month of `year`
    Months { year: i32 },
    /// One group per day of `year`/`month`
    Days { year: i32, month: u32 },
}

/// Which highlight table slice to rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightRefresh {
    /// The year-level highlights of one year
    Year(i32),
    /// The month-level highlights of every month of one year
    Months(i32),
    /// The day-level highlights of every day of one month
    Days { year: i32, month: u32 },
}

/// A track picked to illustrate an archive period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub track_id: TrackId,
    pub title: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub image: Option<String>,
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl Highlight {
    /// Key of the group this highlight belongs to at the given level
    fn group_key(&self, view: ArchiveView) -> i64 {
        match view {
            ArchiveView::Years => i64::from(self.year),
            ArchiveView::Months { .. } => i64::from(self.month.unwrap_or(0)),
            ArchiveView::Days { .. } => i64::from(self.day.unwrap_or(0)),
        }
    }
}

/// Highlights sharing one period, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveGroup {
    /// Year, month or day number
    pub key: i64,
    /// Display label (`2024`, `mai`, `17`)
    pub name: String,
    pub tracks: Vec<Highlight>,
}

impl ArchiveGroup {
    /// Group highlights by period, keeping the incoming order of both groups
    /// and tracks.
    pub fn group(view: ArchiveView, highlights: Vec<Highlight>) -> Vec<ArchiveGroup> {
        let mut groups: Vec<ArchiveGroup> = Vec::new();

        for highlight in highlights {
            let key = highlight.group_key(view);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.tracks.push(highlight),
                None => groups.push(ArchiveGroup {
                    key,
                    name: group_name(view, key),
                    tracks: vec![highlight],
                }),
            }
        }

        groups
    }
}

fn group_name(view: ArchiveView, key: i64) -> String {
    match view {
        ArchiveView::Months { .. } => u32::try_from(key)
            .ok()
            .and_then(calendar::month_name_fr)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string()),
        ArchiveView::Years | ArchiveView::Days { .. } => key.to_string(),
    }
}
