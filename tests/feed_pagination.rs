//! Integration tests for the paginated feed pipeline: sentinel-triggered
//! page fetches, end-of-data predicates, sort-switch isolation, and the
//! full-screen error path.
//!
//! Each test drives the real fetch path (wiremock backend → FeedApi →
//! QueryStore) through the same helpers the event loop uses, applying
//! results with `handle_app_event` exactly as the loop would.

use mosaic::api::FeedApi;
use mosaic::app::{App, AppEvent, FeedsPhase};
use mosaic::config::Config;
use mosaic::feed::SortType;
use mosaic::ui::events::handle_app_event;
use mosaic::ui::helpers::{check_sentinel, spawn_page_fetch, spawn_refetch};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "feedId": id,
        "feedThumbnailImgUrl": format!("https://img.example.com/{}.jpg", id),
        "feedFavorite": false,
    })
}

fn flat_page(start: i64, n: usize) -> serde_json::Value {
    serde_json::Value::Array((start..start + n as i64).map(feed_json).collect())
}

fn brand_page(groups: &[(&str, i64, usize)]) -> serde_json::Value {
    serde_json::json!({
        "brandList": groups
            .iter()
            .map(|(name, start, n)| {
                serde_json::json!({
                    "brandName": name,
                    "feeds": flat_page(*start, *n),
                })
            })
            .collect::<Vec<_>>()
    })
}

fn app_for(server: &MockServer) -> App {
    let config = Config::default();
    let client = reqwest::Client::new();
    let api = FeedApi::new(client.clone(), &format!("{}/api", server.uri())).unwrap();
    App::new(api, client, "http://127.0.0.1:0".to_string(), &config)
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
// Sentinel-driven pagination
// ============================================================================

#[tokio::test]
async fn test_full_page_then_sentinel_fetches_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(0, 8)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(8, 8)))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    app.set_sort(SortType::Recent);
    assert!(spawn_page_fetch(&mut app, &tx));
    drain_one(&mut app, &mut rx, &tx).await;

    // Eight feeds land as three rows of 3/3/2.
    assert_eq!(app.phase, FeedsPhase::Ready);
    assert_eq!(app.feeds.len(), 8);
    assert_eq!(app.grid.row_count(app.feeds.len()), 3);
    assert!(app.grid.cell_index(2, 1) < app.feeds.len());
    assert!(app.grid.cell_index(2, 2) >= app.feeds.len());

    // Scroll to the bottom; the sentinel intersects and page 1 is fetched.
    app.viewport_units = 240;
    app.scroll_offset = app.grid.max_scroll(app.feeds.len(), app.viewport_units);
    check_sentinel(&mut app, &tx);
    assert!(app.is_fetching());
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.feeds.len(), 16);
    assert!(app.has_next_page());
}

#[tokio::test]
async fn test_short_page_ends_pagination_for_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(0, 8)))
        .expect(1)
        .mount(&server)
        .await;
    // Page 1 comes back short: five items.
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(8, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    app.set_sort(SortType::Recent);
    spawn_page_fetch(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    app.viewport_units = 240;
    app.scroll_offset = app.grid.max_scroll(app.feeds.len(), app.viewport_units);
    check_sentinel(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.feeds.len(), 13);
    assert!(!app.has_next_page());

    // The sentinel stays visible at the bottom, but no further request is
    // issued — the page-2 mock does not exist and expect(1) above verifies
    // page 1 was hit exactly once.
    app.scroll_offset = app.grid.max_scroll(app.feeds.len(), app.viewport_units);
    check_sentinel(&mut app, &tx);
    assert!(!app.is_fetching());
    assert_eq!(app.phase, FeedsPhase::Ready);
}

// ============================================================================
// Brand pagination
// ============================================================================

#[tokio::test]
async fn test_brand_duplicate_page_stops_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds/brand"))
        .and(query_param("page", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(brand_page(&[("Aster", 0, 2), ("Briar", 10, 1)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The backend cycles: page 1 repeats the same brands.
    Mock::given(method("GET"))
        .and(path("/api/feeds/brand"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(brand_page(&[("Briar", 20, 1), ("Aster", 30, 1)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    app.set_sort(SortType::Brand);
    spawn_page_fetch(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;
    assert!(app.has_next_page());
    assert_eq!(app.feeds.len(), 3);

    app.viewport_units = 240;
    app.scroll_offset = app.grid.max_scroll(app.feeds.len(), app.viewport_units);
    check_sentinel(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.feeds.len(), 5);
    assert!(!app.has_next_page());

    check_sentinel(&mut app, &tx);
    assert!(!app.is_fetching());
}

#[tokio::test]
async fn test_empty_brand_page_stops_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds/brand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brand_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    app.set_sort(SortType::Brand);
    spawn_page_fetch(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.feeds.len(), 0);
    assert!(!app.has_next_page());
    assert_eq!(app.phase, FeedsPhase::Ready);
}

// ============================================================================
// Sort-switch isolation
// ============================================================================

#[tokio::test]
async fn test_sort_switch_never_merges_stale_in_flight_page() {
    let server = MockServer::start().await;
    // The abandoned mode's page 0 resolves slowly.
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("type", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(flat_page(0, 8))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .and(query_param("type", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(100, 3)))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    // Request Recent page 0, then switch to Oldest while it is in flight.
    app.set_sort(SortType::Recent);
    spawn_page_fetch(&mut app, &tx);
    app.set_sort(SortType::Oldest);
    spawn_page_fetch(&mut app, &tx);

    // Both responses arrive: the fast Oldest page and the slow Recent one.
    drain_one(&mut app, &mut rx, &tx).await;
    drain_one(&mut app, &mut rx, &tx).await;

    // Only Oldest data survives; nothing from the abandoned mode leaked in.
    assert_eq!(app.sort, SortType::Oldest);
    assert_eq!(app.feeds.len(), 3);
    assert!(app.feeds.iter().all(|f| f.id >= 100));
    assert_eq!(app.phase, FeedsPhase::Ready);
    // Short page (3 < 8): exhausted.
    assert!(!app.has_next_page());
}

// ============================================================================
// Fetch failure
// ============================================================================

#[tokio::test]
async fn test_page_failure_is_full_screen_error_and_retry_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let (tx, mut rx) = mpsc::channel(32);

    app.set_sort(SortType::Recent);
    spawn_page_fetch(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    assert!(matches!(app.phase, FeedsPhase::Error(_)));

    // Backend recovers; the retry resets the collection and reloads page 0.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/feeds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flat_page(0, 4)))
        .mount(&server)
        .await;

    spawn_refetch(&mut app, &tx);
    drain_one(&mut app, &mut rx, &tx).await;

    assert_eq!(app.phase, FeedsPhase::Ready);
    assert_eq!(app.feeds.len(), 4);
}
