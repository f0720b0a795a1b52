//! OAuth playlist export flow tests
mod common;

use common::{at, insert_song, FakePlaylists, TestStore, PUBLIC_URL};
use std::sync::Arc;
use std::time::Duration;
use timeuh_core::{PlaylistService, Provider, TimeuhError};
use timeuh_providers::{DeezerClient, DeezerConfig};
use timeuh_server::services::ExportService;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = "https://timeuh.example/";

fn export_service(db: &TestStore, services: Vec<Arc<dyn PlaylistService>>) -> ExportService {
    ExportService::new(
        db.dyn_store(),
        services,
        Url::parse(PUBLIC_URL).unwrap(),
        "RadioMeuh",
    )
}

fn query_value(location: &str, key: &str) -> Option<String> {
    Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// `count` Deezer songs on 2024-05-17, ids `d0` (oldest) to `d<count-1>`
async fn seed_day(db: &TestStore, count: u32) {
    for i in 0..count {
        insert_song(
            db,
            &format!("Song {}", i),
            at(2024, 5, 17, 6 + i / 60, i % 60),
            None,
            Some(&format!("d{}", i)),
        )
        .await;
    }
}

#[tokio::test]
async fn test_initiate_without_tracks_redirects_back() {
    let db = TestStore::new().await;
    let deezer = Arc::new(FakePlaylists::new(Provider::Deezer));
    let service = export_service(&db, vec![deezer]);

    let location = service
        .initiate(Provider::Deezer, 2024, 5, Some(17), Some("/archives/2024/5/17"))
        .await
        .unwrap();

    assert!(location.starts_with("https://timeuh.example/archives/2024/5/17?"));
    assert_eq!(query_value(&location, "export").as_deref(), Some("empty"));
    assert_eq!(
        query_value(&location, "playlist").as_deref(),
        Some("RadioMeuh 17/05/2024")
    );
    assert!(service.pending().is_empty().await);
}

#[tokio::test]
async fn test_initiate_ignores_foreign_referer() {
    let db = TestStore::new().await;
    let service = export_service(&db, vec![Arc::new(FakePlaylists::new(Provider::Deezer))]);

    let location = service
        .initiate(Provider::Deezer, 2024, 5, None, Some("https://evil.example/phish"))
        .await
        .unwrap();

    assert!(location.starts_with("https://timeuh.example/archives?"));
}

#[tokio::test]
async fn test_initiate_rejects_bad_input() {
    let db = TestStore::new().await;
    let service = export_service(&db, vec![Arc::new(FakePlaylists::new(Provider::Deezer))]);

    let err = service
        .initiate(Provider::Spotify, 2024, 5, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimeuhError::InvalidInput(_)), "not configured");

    let err = service
        .initiate(Provider::Deezer, 2023, 2, Some(30), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimeuhError::InvalidInput(_)));
}

#[tokio::test]
async fn test_full_export_creates_playlist_in_batches() {
    let db = TestStore::new().await;
    seed_day(&db, 100).await;
    let deezer = Arc::new(FakePlaylists::new(Provider::Deezer));
    let service = export_service(&db, vec![Arc::clone(&deezer) as Arc<dyn PlaylistService>]);

    let authorize = service
        .initiate(Provider::Deezer, 2024, 5, None, Some("/archives/2024/5"))
        .await
        .unwrap();

    assert!(authorize.starts_with("https://provider.example/authorize?"));
    assert_eq!(
        query_value(&authorize, "redirect_uri").as_deref(),
        Some("https://timeuh.example/finalize/playlist/deezer")
    );
    let state = query_value(&authorize, "state").unwrap();
    assert_eq!(service.pending().len().await, 1);

    let location = service
        .finalize(Provider::Deezer, Some("good-code"), Some(&state))
        .await
        .unwrap();

    assert!(location.starts_with("https://timeuh.example/archives/2024/5?"));
    assert_eq!(query_value(&location, "export").as_deref(), Some("created"));
    assert_eq!(
        query_value(&location, "playlist").as_deref(),
        Some("RadioMeuh Mai 2024")
    );

    let batches = deezer.batches.lock().unwrap().clone();
    assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![80, 20]);

    let tracks = deezer.tracks_of("RadioMeuh Mai 2024").unwrap();
    assert_eq!(tracks.len(), 100);
    assert_eq!(tracks[0], "d99", "newest first");

    // The state is single use
    let again = service
        .finalize(Provider::Deezer, Some("good-code"), Some(&state))
        .await
        .unwrap();
    assert_eq!(again, HOME);
}

#[tokio::test]
async fn test_export_updates_existing_playlist() {
    let db = TestStore::new().await;
    seed_day(&db, 3).await;
    let deezer = Arc::new(
        FakePlaylists::new(Provider::Deezer).with_playlist("pl-9", "RadioMeuh 17/05/2024", &["d1"]),
    );
    let service = export_service(&db, vec![Arc::clone(&deezer) as Arc<dyn PlaylistService>]);

    let authorize = service
        .initiate(Provider::Deezer, 2024, 5, Some(17), None)
        .await
        .unwrap();
    let state = query_value(&authorize, "state").unwrap();
    let location = service
        .finalize(Provider::Deezer, Some("good-code"), Some(&state))
        .await
        .unwrap();

    assert_eq!(query_value(&location, "export").as_deref(), Some("updated"));
    assert_eq!(
        deezer.tracks_of("RadioMeuh 17/05/2024").unwrap(),
        vec!["d1", "d2", "d0"]
    );

    // Exporting again finds nothing new
    let authorize = service
        .initiate(Provider::Deezer, 2024, 5, Some(17), None)
        .await
        .unwrap();
    let state = query_value(&authorize, "state").unwrap();
    let location = service
        .finalize(Provider::Deezer, Some("good-code"), Some(&state))
        .await
        .unwrap();

    assert_eq!(query_value(&location, "export").as_deref(), Some("unchanged"));
    assert_eq!(deezer.batches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_finalize_sends_home_on_bad_callbacks() {
    let db = TestStore::new().await;
    seed_day(&db, 2).await;
    let deezer: Arc<dyn PlaylistService> = Arc::new(FakePlaylists::new(Provider::Deezer));
    let spotify: Arc<dyn PlaylistService> = Arc::new(FakePlaylists::new(Provider::Spotify));
    let service = export_service(&db, vec![deezer, spotify]);

    let state_for = |authorize: String| query_value(&authorize, "state").unwrap();

    // No state, unknown state
    assert_eq!(service.finalize(Provider::Deezer, Some("good-code"), None).await.unwrap(), HOME);
    assert_eq!(
        service
            .finalize(Provider::Deezer, Some("good-code"), Some("forged"))
            .await
            .unwrap(),
        HOME
    );

    // Provider mismatch
    let state = state_for(service.initiate(Provider::Deezer, 2024, 5, None, None).await.unwrap());
    assert_eq!(
        service
            .finalize(Provider::Spotify, Some("good-code"), Some(&state))
            .await
            .unwrap(),
        HOME
    );

    // Visitor declined
    let state = state_for(service.initiate(Provider::Deezer, 2024, 5, None, None).await.unwrap());
    assert_eq!(service.finalize(Provider::Deezer, None, Some(&state)).await.unwrap(), HOME);

    // Code refused by the provider
    let state = state_for(service.initiate(Provider::Deezer, 2024, 5, None, None).await.unwrap());
    assert_eq!(
        service
            .finalize(Provider::Deezer, Some("stale-code"), Some(&state))
            .await
            .unwrap(),
        HOME
    );

    assert!(service.pending().is_empty().await);
}

#[tokio::test]
async fn test_export_reports_provider_failures() {
    let db = TestStore::new().await;
    seed_day(&db, 2).await;
    let mut deezer = FakePlaylists::new(Provider::Deezer);
    deezer.fail_adds = true;
    let service = export_service(&db, vec![Arc::new(deezer)]);

    let authorize = service
        .initiate(Provider::Deezer, 2024, 5, Some(17), Some("/archives/2024/5/17"))
        .await
        .unwrap();
    let state = query_value(&authorize, "state").unwrap();
    let location = service
        .finalize(Provider::Deezer, Some("good-code"), Some(&state))
        .await
        .unwrap();

    assert!(location.starts_with("https://timeuh.example/archives/2024/5/17?"));
    assert_eq!(query_value(&location, "export").as_deref(), Some("failed"));
}

#[tokio::test]
async fn test_export_through_deezer_api() {
    let server = MockServer::start().await;
    let db = TestStore::new().await;
    seed_day(&db, 2).await;

    Mock::given(method("GET"))
        .and(path("/oauth/access_token.php"))
        .and(query_param("code", "deezer-code"))
        .and(query_param("output", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "user-token",
                "expires": 0
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/me/playlists"))
        .and(query_param("access_token", "user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 1, "title": "Loved tracks"}],
            "total": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/user/me/playlists"))
        .and(body_string_contains("title=RadioMeuh+17%2F05%2F2024"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 908622995})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlist/908622995/tracks"))
        .and(body_string_contains("songs=d1%2Cd0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let deezer = DeezerClient::new(DeezerConfig {
        app_id: "app-id".to_string(),
        secret: "app-secret".to_string(),
        connect_url: format!("{}/oauth", server.uri()),
        api_url: server.uri(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let service = export_service(&db, vec![Arc::new(deezer)]);

    let authorize = service
        .initiate(Provider::Deezer, 2024, 5, Some(17), None)
        .await
        .unwrap();
    assert!(authorize.starts_with(&format!("{}/oauth/auth.php?", server.uri())));
    let state = query_value(&authorize, "state").unwrap();

    let location = service
        .finalize(Provider::Deezer, Some("deezer-code"), Some(&state))
        .await
        .unwrap();

    assert_eq!(query_value(&location, "export").as_deref(), Some("created"));
}
