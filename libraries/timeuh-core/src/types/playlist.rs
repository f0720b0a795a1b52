/// Playlist export types
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::Result;

/// A playlist owned by the visitor on a streaming provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

/// OAuth access token obtained from a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` means the token does not expire
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the token can still be used at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// The archive period whose tracks are exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPeriod {
    Month { year: i32, month: u32 },
    Day(NaiveDate),
}

impl ExportPeriod {
    /// Build and validate a period from route segments
    pub fn from_parts(year: i32, month: u32, day: Option<u32>) -> Result<Self> {
        match day {
            Some(day) => Ok(ExportPeriod::Day(calendar::validate_date(year, month, day)?)),
            None => {
                calendar::validate_date(year, month, 1)?;
                Ok(ExportPeriod::Month { year, month })
            }
        }
    }

    /// Playlist name for this period, e.g. `RadioMeuh 17/05/2024` or
    /// `RadioMeuh Mai 2024`
    pub fn playlist_name(&self, prefix: &str) -> String {
        let label = match self {
            ExportPeriod::Day(date) => date.format("%d/%m/%Y").to_string(),
            ExportPeriod::Month { year, month } => {
                let month_name = calendar::month_name_fr(*month)
                    .map(calendar::capitalize)
                    .unwrap_or_else(|| month.to_string());
                format!("{} {}", month_name, year)
            }
        };

        let prefix = prefix.trim();
        if prefix.is_empty() {
            label
        } else {
            format!("{} {}", prefix, label)
        }
    }
}
