/// API route modules
pub mod archives;
pub mod health;
pub mod playlists;
pub mod tracks;

use crate::{error::ServerError, state::AppState};
use axum::{response::IntoResponse, routing::get, Router};
use std::path::PathBuf;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the application router
///
/// Paths outside the API are served from `web_dir` when one is configured,
/// with `index.html` answering for unknown paths.
pub fn create_router(app_state: AppState, web_dir: Option<PathBuf>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/tracks", get(tracks::list_tracks))
        .route("/archives", get(archives::years))
        .route("/archives/:year", get(archives::months))
        .route("/archives/:year/:month", get(archives::days))
        .route("/archives/:year/:month/:day", get(archives::day));

    let export_routes = Router::new()
        .route(
            "/create/playlist/:provider/:year/:month",
            get(playlists::create_month),
        )
        .route(
            "/create/playlist/:provider/:year/:month/:day",
            get(playlists::create_day),
        )
        .route("/finalize/playlist/:provider", get(playlists::finalize));

    let router = Router::new()
        .nest("/api", api_routes)
        .merge(export_routes);

    let router = match web_dir {
        Some(web_dir) => {
            let index = web_dir.join("index.html");
            router.fallback_service(ServeDir::new(web_dir).fallback(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn not_found() -> impl IntoResponse {
    ServerError::NotFound("No such page".to_string())
}
