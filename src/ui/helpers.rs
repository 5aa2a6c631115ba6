//! Helper functions for UI operations.
//!
//! All network work is spawned here: page fetches stamped with the store
//! generation, mutations, thumbnail loads, and the long-press timer. Each
//! task reports back over the `AppEvent` channel and never touches `App`
//! directly.

use crate::api::{BRAND_PAGE_SIZE, FEED_PAGE_SIZE};
use crate::app::{App, AppEvent, FeedsPhase, LONG_PRESS_DURATION};
use crate::feed::PageData;
use crate::image::{fetch_thumbnail, proxy_url, CellPhase};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Wraps a future to catch panics and convert them to errors.
///
/// Spawned tasks otherwise disappear silently on panic; this converts the
/// panic payload to `Err(String)` so the loop can surface it.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            }
        })
}

// ============================================================================
// Page fetching
// ============================================================================

/// Spawn the next page request if the store allows one.
///
/// No-op (returns false) while a fetch is in flight or the more-data
/// predicate is false — scroll events can call this freely.
pub fn spawn_page_fetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    let Some(page) = app.store.begin_page_fetch() else {
        return false;
    };
    let sort = app.sort;
    let generation = app.store.generation();
    let api = app.api.clone();
    let tx = event_tx.clone();

    tracing::debug!(sort = sort.label(), page, generation, "Requesting feed page");
    tokio::spawn(async move {
        let outcome = catch_task_panic(async {
            if sort.is_brand() {
                api.feeds_by_brand(sort.type_code(), page, BRAND_PAGE_SIZE)
                    .await
                    .map(|response| PageData::Brand(response.brand_list))
            } else {
                api.feeds(sort.type_code(), page, FEED_PAGE_SIZE)
                    .await
                    .map(PageData::Flat)
            }
        })
        .await;

        let event = match outcome {
            Ok(result) => AppEvent::PageLoaded {
                sort,
                generation,
                page,
                result,
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "page_fetch",
                error,
            },
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Page result dropped (receiver gone)");
        }
    });
    true
}

/// Reset the active collection and fetch page 0 again — the error-screen
/// retry and the post-delete refetch both land here.
pub fn spawn_refetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.set_sort(app.sort);
    spawn_page_fetch(app, event_tx);
}

/// Fetch the next page when the sentinel row has scrolled into view.
pub fn check_sentinel(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.phase != FeedsPhase::Ready || app.viewport_units == 0 {
        return;
    }
    if !app.has_next_page() || app.is_fetching() {
        return;
    }
    if app
        .grid
        .sentinel_visible(app.scroll_offset, app.viewport_units, app.feeds.len())
    {
        spawn_page_fetch(app, event_tx);
    }
}

// ============================================================================
// Mutations
// ============================================================================

pub fn spawn_toggle_favorite(app: &App, event_tx: &mpsc::Sender<AppEvent>, feed_id: i64) {
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.toggle_favorite(feed_id).await;
        if tx
            .send(AppEvent::FavoriteToggled { feed_id, result })
            .await
            .is_err()
        {
            tracing::warn!(feed_id, "Favorite result dropped (receiver gone)");
        }
    });
}

pub fn spawn_albums_load(app: &App, event_tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.albums().await;
        let _ = tx.send(AppEvent::AlbumsLoaded { result }).await;
    });
}

/// Create an album from the current selection.
///
/// Fails fast — alert, no network call, state untouched — when the
/// trimmed title is empty or nothing is selected. Returns whether a
/// request was actually issued.
pub fn submit_create_album(
    app: &mut App,
    event_tx: &mpsc::Sender<AppEvent>,
    title: &str,
) -> bool {
    let title = title.trim();
    if title.is_empty() || app.selection.is_empty() {
        app.open_alert("Enter an album title first.");
        return false;
    }
    let title = title.to_string();
    let feed_ids = app.selection_sorted();
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api
            .create_album(&title, &feed_ids)
            .await
            .map(|response| response.album_id);
        let _ = tx.send(AppEvent::AlbumCreated { title, result }).await;
    });
    true
}

/// Add the current selection to an existing album. Fails fast on an
/// empty selection.
pub fn submit_add_to_album(
    app: &mut App,
    event_tx: &mpsc::Sender<AppEvent>,
    album_id: i64,
) -> bool {
    if app.selection.is_empty() {
        app.open_alert("Select photos to add first.");
        return false;
    }
    let feed_ids = app.selection_sorted();
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.add_photos_to_album(album_id, &feed_ids).await;
        let _ = tx.send(AppEvent::PhotosAdded { album_id, result }).await;
    });
    true
}

/// Delete the current selection in one batch. Fails fast on an empty
/// selection.
pub fn submit_delete_selected(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    if app.selection.is_empty() {
        app.open_alert("Select photos to delete first.");
        return false;
    }
    let feed_ids = app.selection_sorted();
    let count = feed_ids.len();
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.delete_feeds(&feed_ids).await;
        let _ = tx.send(AppEvent::FeedsDeleted { count, result }).await;
    });
    true
}

// ============================================================================
// Long press
// ============================================================================

/// Begin a press: arm the tracker and start the 800ms timer task. Any
/// previous timer is aborted first.
pub fn start_long_press(
    app: &mut App,
    event_tx: &mpsc::Sender<AppEvent>,
    cell: Option<usize>,
) {
    app.abort_press_timer();
    let generation = app.press.start(Instant::now(), cell);
    let tx = event_tx.clone();
    app.press_handle = Some(tokio::spawn(async move {
        tokio::time::sleep(LONG_PRESS_DURATION).await;
        let _ = tx.send(AppEvent::LongPressFired { generation }).await;
    }));
}

/// End a press without firing: abort the timer and return the press state
/// (so the caller can treat a short press as a click).
pub fn end_long_press(app: &mut App) -> Option<crate::app::PressState> {
    app.abort_press_timer();
    app.press.release()
}

/// Cancel a press entirely (pointer left the grid, teardown).
pub fn cancel_long_press(app: &mut App) {
    app.abort_press_timer();
    app.press.cancel();
}

// ============================================================================
// Thumbnail loading
// ============================================================================

fn spawn_thumbnail(app: &App, event_tx: &mpsc::Sender<AppEvent>, feed_id: i64, raw_url: &str) {
    let client = app.http_client.clone();
    let url = proxy_url(&app.proxy_base, raw_url);
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = fetch_thumbnail(&client, &url).await;
        let _ = tx.send(AppEvent::ThumbnailLoaded { feed_id, result }).await;
    });
}

/// Tick-driven cell loading.
///
/// Starts loads for pending cells that are priority or within viewport
/// proximity, serves cache hits without a fetch, and re-spawns fetches for
/// retry deadlines that came due.
pub fn drive_cell_loads(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.phase != FeedsPhase::Ready || app.viewport_units == 0 {
        return;
    }

    // Retry deadlines first: these cells are already past the gate.
    let due = app.cells.poll_retries(Instant::now());
    if !due.is_empty() {
        let feeds = app.feeds.clone();
        for feed_id in due {
            let url = feeds
                .iter()
                .find(|f| f.id == feed_id)
                .and_then(|f| f.thumbnail_url.clone());
            match url {
                Some(url) => spawn_thumbnail(app, event_tx, feed_id, &url),
                // The feed left the collection between failure and deadline.
                None => app.cells.manual_retry(feed_id),
            }
        }
        app.needs_redraw = true;
    }

    let feeds = app.feeds.clone();
    for (index, feed) in feeds.iter().enumerate() {
        let Some(raw_url) = feed.thumbnail_url.as_deref() else {
            continue;
        };
        if app.cells.phase(feed.id) != CellPhase::Pending {
            continue;
        }
        let gated = app.is_priority_cell(index)
            || app
                .grid
                .cell_in_proximity(index, app.scroll_offset, app.viewport_units);
        if !gated {
            continue;
        }
        if app.thumbnails.contains(feed.id) {
            app.cells.mark_loaded(feed.id);
            app.needs_redraw = true;
            continue;
        }
        if app.cells.begin_load(feed.id) {
            spawn_thumbnail(app, event_tx, feed.id, raw_url);
            app.needs_redraw = true;
        }
    }
}
