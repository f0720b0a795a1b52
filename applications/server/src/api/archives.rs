/// Archive browsing API routes
use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use timeuh_core::{calendar, ArchiveGroup, ArchiveView, Track};

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub groups: Vec<ArchiveGroup>,
    /// Songs played during the month, on the month level only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: String,
    pub tracks: Vec<Track>,
}

async fn highlights(app_state: &AppState, view: ArchiveView) -> Result<Json<ArchiveResponse>> {
    let highlights = app_state.store.highlights(view).await?;
    Ok(Json(ArchiveResponse {
        groups: ArchiveGroup::group(view, highlights),
        track_count: None,
    }))
}

/// GET /api/archives - highlights of every year
pub async fn years(State(app_state): State<AppState>) -> Result<Json<ArchiveResponse>> {
    highlights(&app_state, ArchiveView::Years).await
}

/// GET /api/archives/:year - highlights of each month of a year
pub async fn months(
    Path(year): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<Json<ArchiveResponse>> {
    calendar::validate_date(year, 1, 1)?;
    highlights(&app_state, ArchiveView::Months { year }).await
}

/// GET /api/archives/:year/:month - highlights of each day of a month
pub async fn days(
    Path((year, month)): Path<(i32, u32)>,
    State(app_state): State<AppState>,
) -> Result<Json<ArchiveResponse>> {
    calendar::validate_date(year, month, 1)?;
    let Json(mut response) = highlights(&app_state, ArchiveView::Days { year, month }).await?;
    response.track_count = Some(app_state.store.count_by_month(year, month).await?);
    Ok(Json(response))
}

/// GET /api/archives/:year/:month/:day - every track of a day
pub async fn day(
    Path((year, month, day)): Path<(i32, u32, u32)>,
    State(app_state): State<AppState>,
) -> Result<Json<DayResponse>> {
    let date = calendar::validate_date(year, month, day)?;
    let tracks = app_state.store.find_by_day(date).await?;

    Ok(Json(DayResponse {
        date: date.format("%Y-%m-%d").to_string(),
        tracks,
    }))
}
