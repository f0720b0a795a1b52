/// Latest tracks API routes
use crate::{error::Result, state::AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use timeuh_core::{schedule, Track};

#[derive(Debug, Deserialize)]
pub struct TracksQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    /// Track on air, if one started recently
    pub current: Option<Track>,
    pub tracks: Vec<Track>,
    pub page: u32,
    pub per_page: u32,
}

/// GET /api/tracks?page=
///
/// The current track is left out of the page so it is not listed twice.
pub async fn list_tracks(
    State(app_state): State<AppState>,
    Query(query): Query<TracksQuery>,
) -> Result<Json<TracksResponse>> {
    let page = query.page.max(1);
    let now = schedule::station_now(app_state.timezone);

    let current = app_state.store.find_currently_playing(now).await?;
    let tracks = app_state
        .store
        .find_latest_page(
            app_state.tracks_per_page,
            current.as_ref().map(|t| t.id),
            page,
        )
        .await?;

    Ok(Json(TracksResponse {
        current,
        tracks,
        page,
        per_page: app_state.tracks_per_page,
    }))
}
