//! Integration tests for favorites, select mode, and the album batch
//! operations: fail-fast validation, invalidation side effects, and the
//! selection lifecycle across success and failure outcomes.

use mosaic::api::{Feed, FeedApi};
use mosaic::app::{AlbumModal, App, AppEvent, FeedsPhase, Mode};
use mosaic::config::Config;
use mosaic::feed::{PageData, QueryKey, SortType};
use mosaic::ui::events::handle_app_event;
use mosaic::ui::helpers::{
    end_long_press, spawn_toggle_favorite, start_long_press, submit_add_to_album,
    submit_create_album, submit_delete_selected,
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server: &MockServer) -> App {
    let config = Config::default();
    let client = reqwest::Client::new();
    let api = FeedApi::new(client.clone(), &format!("{}/api", server.uri())).unwrap();
    App::new(api, client, "http://127.0.0.1:0".to_string(), &config)
}

/// App with an unreachable backend, for tests that never touch the network.
fn offline_app() -> App {
    let config = Config::default();
    let client = reqwest::Client::new();
    let api = FeedApi::new(client.clone(), "http://127.0.0.1:9/api").unwrap();
    App::new(api, client, "http://127.0.0.1:9".to_string(), &config)
}

/// Install a flat page directly into the store, skipping the network.
fn seed_feeds(app: &mut App, ids: &[i64]) {
    let generation = app.set_sort(SortType::Recent);
    app.store.begin_page_fetch();
    let feeds: Vec<Feed> = ids
        .iter()
        .map(|&id| Feed {
            id,
            thumbnail_url: Some(format!("https://img.example.com/{}.jpg", id)),
            favorite: false,
            brand_name: None,
        })
        .collect();
    app.store
        .complete_page(SortType::Recent, generation, PageData::Flat(feeds));
    app.phase = FeedsPhase::Ready;
    app.rebuild_feeds();
}

async fn drain_one(
    app: &mut App,
    rx: &mut mpsc::Receiver<AppEvent>,
    tx: &mpsc::Sender<AppEvent>,
) {
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an app event")
        .expect("event channel closed");
    handle_app_event(app, event, tx);
}

// ============================================================================
// Favorite toggling
// ============================================================================

#[tokio::test]
async fn test_favorite_toggle_success_updates_overlay_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/feeds/5/favorite"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"feedId": 5, "isFavorite": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[5, 6]);
    let (tx, mut rx) = mpsc::channel(32);

    spawn_toggle_favorite(&app, &tx, 5);
    drain_one(&mut app, &mut rx, &tx).await;

    assert!(app.overlay.get(5).unwrap());
    // The cached collection is patched in place.
    let cached = app.store.feeds().unwrap().collection.flatten();
    assert!(cached.iter().any(|f| f.id == 5 && f.favorite));
    // The dependent favorites-album query was invalidated.
    assert_eq!(app.store.invalidation_count(QueryKey::FavoritesAlbum), 1);
    assert!(app.alert.is_none());
}

#[tokio::test]
async fn test_favorite_toggle_failure_alerts_and_leaves_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/feeds/5/favorite"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[5]);
    let (tx, mut rx) = mpsc::channel(32);

    spawn_toggle_favorite(&app, &tx, 5);
    drain_one(&mut app, &mut rx, &tx).await;

    assert!(app.alert.is_some());
    assert_eq!(app.overlay.get(5), Some(false));
    assert_eq!(app.store.invalidation_count(QueryKey::FavoritesAlbum), 0);
}

#[tokio::test]
async fn test_favorite_toggle_twice_returns_to_original() {
    let server = MockServer::start().await;
    // First toggle turns the favorite on, the second turns it back off.
    Mock::given(method("POST"))
        .and(path("/api/feeds/5/favorite"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"feedId": 5, "isFavorite": true})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/feeds/5/favorite"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"feedId": 5, "isFavorite": false})),
        )
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[5]);
    let (tx, mut rx) = mpsc::channel(32);

    spawn_toggle_favorite(&app, &tx, 5);
    drain_one(&mut app, &mut rx, &tx).await;
    assert_eq!(app.overlay.get(5), Some(true));

    spawn_toggle_favorite(&app, &tx, 5);
    drain_one(&mut app, &mut rx, &tx).await;
    assert_eq!(app.overlay.get(5), Some(false));
}

// ============================================================================
// Long press
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_press_held_past_threshold_enters_select_mode() {
    let mut app = offline_app();
    seed_feeds(&mut app, &[1, 2, 3]);
    let (tx, mut rx) = mpsc::channel(32);

    start_long_press(&mut app, &tx, Some(0));
    tokio::time::advance(Duration::from_millis(900)).await;

    let event = rx.recv().await.expect("long-press timer should fire");
    handle_app_event(&mut app, event, &tx);
    assert_eq!(app.mode, Mode::Select);
}

#[tokio::test(start_paused = true)]
async fn test_press_released_early_stays_in_default_mode() {
    let mut app = offline_app();
    seed_feeds(&mut app, &[1, 2, 3]);
    let (tx, mut rx) = mpsc::channel(32);

    start_long_press(&mut app, &tx, Some(0));
    tokio::time::advance(Duration::from_millis(500)).await;
    let state = end_long_press(&mut app).expect("press state");
    assert!(!state.fired);

    // Even if the aborted timer raced its send, the stale generation is
    // ignored on arrival.
    tokio::time::advance(Duration::from_millis(1000)).await;
    while let Ok(event) = rx.try_recv() {
        handle_app_event(&mut app, event, &tx);
    }
    assert_eq!(app.mode, Mode::Default);
}

// ============================================================================
// Album creation
// ============================================================================

#[tokio::test]
async fn test_create_album_blank_title_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2]);
    app.enter_select_mode();
    app.toggle_selection(1);
    app.album_modal = Some(AlbumModal::Create {
        title: "   ".to_string(),
    });
    let (tx, _rx) = mpsc::channel(32);

    assert!(!submit_create_album(&mut app, &tx, "   "));

    // Alert shown; mode and selection untouched.
    assert!(app.alert.is_some());
    assert_eq!(app.mode, Mode::Select);
    assert!(app.selection.contains(&1));
    server.verify().await;
}

#[tokio::test]
async fn test_create_album_empty_selection_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    app.enter_select_mode();
    let (tx, _rx) = mpsc::channel(32);

    assert!(!submit_create_album(&mut app, &tx, "Trip"));
    assert!(app.alert.is_some());
    server.verify().await;
}

#[tokio::test]
async fn test_create_album_success_invalidates_and_resets_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"albumId": 42})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2, 3]);
    app.enter_select_mode();
    app.toggle_selection(1);
    app.toggle_selection(3);
    app.album_modal = Some(AlbumModal::Create {
        title: "Trip".to_string(),
    });
    let (tx, mut rx) = mpsc::channel(32);

    assert!(submit_create_album(&mut app, &tx, "Trip"));
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.mode, Mode::Default);
    assert!(app.selection.is_empty());
    assert!(app.album_modal.is_none());
    assert!(app.alert.as_deref().unwrap().contains("created"));
    assert!(app.store.invalidation_count(QueryKey::Albums) >= 1);
    assert!(app.store.invalidation_count(QueryKey::FavoritesAlbum) >= 1);
}

#[tokio::test]
async fn test_create_album_failure_alerts_and_still_resets_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2]);
    app.enter_select_mode();
    app.toggle_selection(2);
    let (tx, mut rx) = mpsc::channel(32);

    assert!(submit_create_album(&mut app, &tx, "Trip"));
    drain_one(&mut app, &mut rx, &tx).await;

    assert!(app.alert.as_deref().unwrap().contains("Could not create"));
    assert_eq!(app.mode, Mode::Default);
    assert!(app.selection.is_empty());
}

// ============================================================================
// Add to album
// ============================================================================

#[tokio::test]
async fn test_add_to_album_success_invalidates_albums() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums/7/photos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2]);
    app.enter_select_mode();
    app.toggle_selection(1);
    app.album_modal = Some(AlbumModal::Add { selected: 0 });

    // The modal is open over a non-empty selection.
    assert!(!app.selection.is_empty());

    let (tx, mut rx) = mpsc::channel(32);
    assert!(submit_add_to_album(&mut app, &tx, 7));
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.mode, Mode::Default);
    assert!(app.selection.is_empty());
    assert!(app.album_modal.is_none());
    assert_eq!(app.store.invalidation_count(QueryKey::Albums), 1);
}

#[tokio::test]
async fn test_add_to_album_empty_selection_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/albums/7/photos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, _rx) = mpsc::channel(32);

    assert!(!submit_add_to_album(&mut app, &tx, 7));
    assert!(app.alert.is_some());
    server.verify().await;
}

// ============================================================================
// Batch delete
// ============================================================================

#[tokio::test]
async fn test_delete_success_invalidates_faces_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/feeds/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;
    // The refetch after deletion reloads page 0.
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"feedId": 2, "feedFavorite": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2]);
    app.enter_select_mode();
    app.toggle_selection(1);
    let (tx, mut rx) = mpsc::channel(32);

    assert!(submit_delete_selected(&mut app, &tx));
    drain_one(&mut app, &mut rx, &tx).await; // FeedsDeleted
    assert_eq!(app.store.invalidation_count(QueryKey::Faces), 1);
    assert_eq!(app.mode, Mode::Default);
    assert!(app.selection.is_empty());

    drain_one(&mut app, &mut rx, &tx).await; // refetched page 0
    assert_eq!(app.phase, FeedsPhase::Ready);
    assert_eq!(app.feeds.len(), 1);
    assert_eq!(app.feeds[0].id, 2);
}

#[tokio::test]
async fn test_delete_failure_alerts_without_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/feeds/delete"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    seed_feeds(&mut app, &[1, 2]);
    app.enter_select_mode();
    app.toggle_selection(1);
    let (tx, mut rx) = mpsc::channel(32);

    assert!(submit_delete_selected(&mut app, &tx));
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.alert.as_deref(), Some("Delete failed."));
    assert_eq!(app.mode, Mode::Default);
    assert!(app.selection.is_empty());
    // No refetch was issued: the grid is still the seeded collection.
    assert_eq!(app.phase, FeedsPhase::Ready);
    assert_eq!(app.feeds.len(), 2);
    assert_eq!(app.store.invalidation_count(QueryKey::Faces), 0);
}
