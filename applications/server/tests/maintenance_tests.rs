//! Link repair and archive refresh tests
mod common;

use chrono::NaiveDate;
use common::{at, entry, insert_song, FakeFeed, FakeResolver, TestStore};
use std::sync::Arc;
use std::time::Duration;
use timeuh_core::{
    classify::{Classifier, ExcludeRules},
    ArchiveView, CreateTrack, LinkResolver, MissingLinks, TimeuhError, TrackStore,
};
use timeuh_server::jobs::Poller;
use timeuh_server::services::{
    ArchiveService, IngestOutcome, IngestService, RepairReport, RepairService,
};

async fn insert_unresolved(db: &TestStore, title: &str, started_at: chrono::NaiveDateTime) {
    let mut track = CreateTrack::new(title, "Album", "Artist", "https://img/feed.jpg", started_at);
    track.valid = true;
    db.store.insert_track(track).await.unwrap();
}

// =============================================================================
// Repair
// =============================================================================

#[tokio::test]
async fn test_repair_resolves_tracks_without_links() {
    let db = TestStore::new().await;
    insert_unresolved(&db, "Teardrop", at(2024, 5, 17, 14, 3)).await;
    insert_unresolved(&db, "Obscure B-Side", at(2024, 5, 17, 14, 10)).await;

    let resolver =
        Arc::new(FakeResolver::default().knows("Teardrop", Some("spotify:track:1"), None));
    let service = RepairService::new(resolver, db.dyn_store());

    let report = service.repair(MissingLinks::Tuneefy, None).await.unwrap();
    assert_eq!(
        report,
        RepairReport {
            updated: 1,
            remaining: 1
        }
    );

    let left = db.store.find_missing(MissingLinks::Tuneefy, None).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].title, "Obscure B-Side");

    let fixed = db.store.find_by_day(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()).await.unwrap();
    let teardrop = fixed.iter().find(|t| t.title == "Teardrop").unwrap();
    assert_eq!(teardrop.tuneefy_link.as_deref(), Some("https://tuneefy.com/t/teardrop"));
    assert_eq!(teardrop.spotify_link.as_deref(), Some("spotify:track:1"));
    assert_eq!(teardrop.image.as_deref(), Some("https://tuneefy.example/teardrop.jpg"));
}

#[tokio::test]
async fn test_repair_reads_provider_links_from_share_page() {
    let db = TestStore::new().await;
    insert_song(&db, "Angel", at(2024, 5, 17, 13, 58), None, Some("3129420")).await;
    insert_song(&db, "Teardrop", at(2024, 5, 17, 14, 3), None, None).await;

    let resolver = Arc::new(FakeResolver::default().share_page(
        "https://tuneefy.com/t/angel",
        Some("spotify:track:angel"),
        Some("999"),
    ));
    let service = RepairService::new(resolver, db.dyn_store());

    let report = service.repair(MissingLinks::Spotify, None).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.remaining, 1);

    let tracks = db.store.find_latest_page(20, None, 1).await.unwrap();
    let angel = tracks.iter().find(|t| t.title == "Angel").unwrap();
    assert_eq!(angel.spotify_link.as_deref(), Some("spotify:track:angel"));
    // Only the requested provider column is touched
    assert_eq!(angel.deezer_link.as_deref(), Some("3129420"));
}

#[tokio::test]
async fn test_repair_respects_from_date() {
    let db = TestStore::new().await;
    insert_unresolved(&db, "Old", at(2024, 1, 3, 10, 0)).await;
    insert_unresolved(&db, "Recent", at(2024, 5, 17, 10, 0)).await;

    let resolver = Arc::new(FakeResolver::default());
    let service =
        RepairService::new(Arc::clone(&resolver) as Arc<dyn LinkResolver>, db.dyn_store());

    let report = service
        .repair(MissingLinks::Tuneefy, Some(at(2024, 5, 1, 0, 0)))
        .await
        .unwrap();

    assert_eq!(report.remaining, 1);
    assert_eq!(*resolver.calls.lock().unwrap(), vec!["Recent".to_string()]);
}

// =============================================================================
// Archives
// =============================================================================

async fn seed_archive(db: &TestStore) {
    insert_song(db, "Teardrop", at(2024, 5, 17, 14, 3), None, None).await;
    insert_song(db, "Angel", at(2024, 5, 18, 9, 0), None, None).await;
    insert_song(db, "Roads", at(2024, 3, 2, 22, 15), None, None).await;
    insert_song(db, "Kerala", at(2023, 11, 20, 8, 30), None, None).await;
}

#[tokio::test]
async fn test_update_current_refreshes_running_periods() {
    let db = TestStore::new().await;
    seed_archive(&db).await;
    let service = ArchiveService::new(db.dyn_store(), 2023);

    let slices = service
        .update_current(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
        .await
        .unwrap();
    assert_eq!(slices, 3);

    let years = db.store.highlights(ArchiveView::Years).await.unwrap();
    assert!(!years.is_empty());
    assert!(years.iter().all(|h| h.year == 2024), "2023 is not refreshed");

    let months = db.store.highlights(ArchiveView::Months { year: 2024 }).await.unwrap();
    let mut month_numbers: Vec<u32> = months.iter().filter_map(|h| h.month).collect();
    month_numbers.dedup();
    assert_eq!(month_numbers, vec![5, 3]);

    let days = db
        .store
        .highlights(ArchiveView::Days { year: 2024, month: 5 })
        .await
        .unwrap();
    let mut day_numbers: Vec<u32> = days.iter().filter_map(|h| h.day).collect();
    day_numbers.dedup();
    assert_eq!(day_numbers, vec![18, 17]);

    // Past months only get day highlights from a full rebuild
    let march = db
        .store
        .highlights(ArchiveView::Days { year: 2024, month: 3 })
        .await
        .unwrap();
    assert!(march.is_empty());
}

#[tokio::test]
async fn test_update_all_time_covers_every_year() {
    let db = TestStore::new().await;
    seed_archive(&db).await;
    let service = ArchiveService::new(db.dyn_store(), 2023);

    let slices = service
        .update_all_time(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
        .await
        .unwrap();
    // Per year: the year, its months and twelve months of days
    assert_eq!(slices, 2 * 14);

    let years = db.store.highlights(ArchiveView::Years).await.unwrap();
    let mut year_numbers: Vec<i32> = years.iter().map(|h| h.year).collect();
    year_numbers.dedup();
    assert_eq!(year_numbers, vec![2024, 2023]);

    let november = db
        .store
        .highlights(ArchiveView::Days { year: 2023, month: 11 })
        .await
        .unwrap();
    assert_eq!(november.len(), 1);
    assert_eq!(november[0].title, "Kerala");
}

// =============================================================================
// Poller
// =============================================================================

fn poller(db: &TestStore, feed: Arc<FakeFeed>) -> Poller {
    let ingest = IngestService::new(
        feed,
        Arc::new(FakeResolver::default()),
        db.dyn_store(),
        Classifier::new("radiomeuh", ExcludeRules::default()),
        chrono_tz::Europe::Paris,
    );
    Poller::new(
        Arc::new(ingest),
        Arc::new(ArchiveService::new(db.dyn_store(), 2017)),
        chrono_tz::Europe::Paris,
        Duration::from_secs(60),
        Duration::from_secs(3600),
    )
}

#[tokio::test]
async fn test_poller_steps_survive_failures() {
    let db = TestStore::new().await;

    let down = poller(&db, FakeFeed::failing(|| TimeuhError::network("timeout")));
    assert_eq!(down.poll_once().await, Some(IngestOutcome::Failure));
    assert_eq!(down.refresh_once().await, Some(3));

    let up = poller(
        &db,
        FakeFeed::with(vec![entry("10:00:00", "Teardrop", "Mezzanine", "Massive Attack")]),
    );
    assert!(matches!(
        up.poll_once().await,
        Some(IngestOutcome::Success { inserted: 1, .. })
    ));
}
