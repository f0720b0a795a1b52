/// Playlist export routes
///
/// Both routes answer with a redirect: to the provider's consent page, or
/// back to the site with the outcome in the query string.
use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::Redirect,
};
use serde::Deserialize;
use timeuh_core::Provider;

#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    #[serde(default)]
    pub referer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// The explicit `?referer=` wins over the request header
fn referer(query: &CreateQuery, headers: &HeaderMap) -> Option<String> {
    query.referer.clone().or_else(|| {
        headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// GET /create/playlist/:provider/:year/:month
pub async fn create_month(
    Path((provider, year, month)): Path<(String, i32, u32)>,
    Query(query): Query<CreateQuery>,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Redirect> {
    let provider: Provider = provider.parse()?;
    let referer = referer(&query, &headers);
    let location = app_state
        .exports
        .initiate(provider, year, month, None, referer.as_deref())
        .await?;
    Ok(Redirect::to(&location))
}

/// GET /create/playlist/:provider/:year/:month/:day
pub async fn create_day(
    Path((provider, year, month, day)): Path<(String, i32, u32, u32)>,
    Query(query): Query<CreateQuery>,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Redirect> {
    let provider: Provider = provider.parse()?;
    let referer = referer(&query, &headers);
    let location = app_state
        .exports
        .initiate(provider, year, month, Some(day), referer.as_deref())
        .await?;
    Ok(Redirect::to(&location))
}

/// GET /finalize/playlist/:provider?code=&state=
pub async fn finalize(
    Path(provider): Path<String>,
    Query(query): Query<FinalizeQuery>,
    State(app_state): State<AppState>,
) -> Result<Redirect> {
    let provider: Provider = provider.parse()?;
    let location = app_state
        .exports
        .finalize(provider, query.code.as_deref(), query.state.as_deref())
        .await?;
    Ok(Redirect::to(&location))
}
