//! Application event handling.
//!
//! Applies background-task results to `App`: page responses (with stale
//! generation rejection), mutation outcomes, thumbnail loads, and the
//! long-press timer. This is the only place those results touch state.

use crate::api::ApiError;
use crate::app::{AlbumModal, App, AppEvent, FeedsPhase, Mode};
use crate::feed::{PageData, PageOutcome, QueryKey, SortType};
use crate::image::CellPhase;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::spawn_refetch;

/// Handle one event from a background task.
pub fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::PageLoaded {
            sort,
            generation,
            page,
            result,
        } => handle_page_loaded(app, sort, generation, page, result),

        AppEvent::FavoriteToggled { feed_id, result } => match result {
            Ok(response) => {
                app.overlay
                    .apply_toggle(response.feed_id, response.is_favorite);
                app.store
                    .set_favorite(response.feed_id, response.is_favorite);
                app.store.invalidate(QueryKey::FavoritesAlbum);
                tracing::debug!(
                    feed_id = response.feed_id,
                    favorite = response.is_favorite,
                    "Favorite toggled"
                );
            }
            Err(error) => {
                tracing::warn!(feed_id, error = %error, "Favorite toggle failed");
                app.open_alert("Failed to update favorite.");
            }
        },

        AppEvent::AlbumsLoaded { result } => match result {
            Ok(albums) => {
                let count = albums.len();
                app.store.set_albums(albums);
                if let Some(AlbumModal::Add { selected }) = &mut app.album_modal {
                    *selected = (*selected).min(count.saturating_sub(1));
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "Album list load failed");
                // Keep select mode and the selection: the user can reopen
                // the picker without re-selecting photos.
                app.album_modal = None;
                app.open_alert("Failed to load albums.");
            }
        },

        AppEvent::AlbumCreated { title, result } => {
            match result {
                Ok(album_id) => {
                    tracing::info!(album_id, title = %title, "Album created");
                    app.store.invalidate_album_listings();
                    app.set_status(format!("Opening album {}", album_id));
                    app.open_alert(format!("Album \"{}\" created.", title));
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Album creation failed");
                    app.open_alert("Could not create the album.");
                }
            }
            app.finish_batch_action();
        }

        AppEvent::PhotosAdded { album_id, result } => {
            match result {
                Ok(()) => {
                    tracing::info!(album_id, "Photos added to album");
                    app.store.invalidate(QueryKey::Albums);
                    app.set_status(format!("Opening album {}", album_id));
                    app.open_alert("Photos added to the album.");
                }
                Err(error) => {
                    tracing::warn!(album_id, error = %error, "Add to album failed");
                    app.open_alert("Could not add photos to the album.");
                }
            }
            app.finish_batch_action();
        }

        AppEvent::FeedsDeleted { count, result } => match result {
            Ok(()) => {
                tracing::info!(count, "Feeds deleted");
                app.store.invalidate(QueryKey::Faces);
                app.open_alert(format!("Deleted {} photos.", count));
                app.finish_batch_action();
                spawn_refetch(app, event_tx);
            }
            Err(error) => {
                tracing::warn!(error = %error, "Feed deletion failed");
                app.open_alert("Delete failed.");
                app.finish_batch_action();
            }
        },

        AppEvent::ThumbnailLoaded { feed_id, result } => match result {
            Ok(bytes) => {
                app.cells.mark_loaded(feed_id);
                app.thumbnails.insert(feed_id, bytes);
            }
            Err(error) => {
                // A sort switch may have torn the cell down mid-flight.
                if app.cells.phase(feed_id) == CellPhase::Loading {
                    let phase = app.cells.mark_failed(feed_id, Instant::now());
                    tracing::debug!(feed_id, error = %error, ?phase, "Thumbnail load failed");
                }
            }
        },

        AppEvent::LongPressFired { generation } => {
            if app.press.mark_fired(generation).is_some() && app.mode == Mode::Default {
                app.enter_select_mode();
                app.set_status("Select mode — Space to pick, a: album, d: delete");
            }
        }

        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            if task == "page_fetch" {
                let generation = app.store.generation();
                app.store.fail_page(app.sort, generation);
                if app.phase == FeedsPhase::Loading {
                    app.phase = FeedsPhase::Error("internal error while loading feeds".to_string());
                }
            }
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

fn handle_page_loaded(
    app: &mut App,
    sort: SortType,
    generation: u64,
    page: usize,
    result: Result<PageData, ApiError>,
) {
    match result {
        Ok(data) => match app.store.complete_page(sort, generation, data) {
            PageOutcome::Appended {
                has_next,
                feed_count,
            } => {
                tracing::info!(
                    sort = sort.label(),
                    page,
                    feed_count,
                    has_next,
                    "Feed page merged"
                );
                app.phase = FeedsPhase::Ready;
                app.rebuild_feeds();
            }
            PageOutcome::Stale => {
                tracing::debug!(sort = sort.label(), page, "Stale page discarded");
            }
            PageOutcome::ShapeMismatch => {
                tracing::warn!(sort = sort.label(), page, "Page shape mismatch discarded");
            }
        },
        Err(error) => {
            // Stale failures belong to an abandoned sort; ignore them.
            if generation != app.store.generation() || sort != app.sort {
                tracing::debug!(sort = sort.label(), error = %error, "Stale page failure ignored");
                return;
            }
            app.store.fail_page(sort, generation);
            tracing::error!(sort = sort.label(), page, error = %error, "Feed page load failed");
            app.phase = FeedsPhase::Error(error.to_string());
            app.needs_redraw = true;
        }
    }
}
