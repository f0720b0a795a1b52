/// Shared application state
use crate::services::ExportService;
use chrono_tz::Tz;
use std::sync::Arc;
use timeuh_core::TrackStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrackStore>,
    pub exports: Arc<ExportService>,
    pub tracks_per_page: u32,
    pub timezone: Tz,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TrackStore>,
        exports: Arc<ExportService>,
        tracks_per_page: u32,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            exports,
            tracks_per_page,
            timezone,
        }
    }
}
