//! Input handling for the TUI.
//!
//! Keyboard and mouse events dispatch through here. Overlays capture input
//! first (alert, album modals, full-screen error state); the grid handles
//! the rest. Mouse presses feed the long-press tracker — a held press
//! promotes to select mode, a short press is a click.

use crate::app::{AlbumModal, App, AppEvent, FeedsPhase, Mode};
use crate::feed::SortType;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use super::helpers::{
    cancel_long_press, end_long_press, spawn_albums_load, spawn_page_fetch, spawn_refetch,
    spawn_toggle_favorite, start_long_press, submit_add_to_album, submit_create_album,
    submit_delete_selected,
};
use super::Action;

/// Scroll step for mouse wheel events, in grid units.
const WHEEL_STEP: i64 = 60;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    _modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // The alert overlay captures everything until dismissed.
    if app.alert.is_some() {
        if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return Action::Continue;
    }

    if app.album_modal.is_some() {
        return handle_modal_input(app, code, event_tx);
    }

    if let FeedsPhase::Error(_) = app.phase {
        return handle_error_input(app, code, event_tx);
    }

    handle_grid_input(app, code, event_tx)
}

/// Full-screen error state: retry or quit.
fn handle_error_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('r') | KeyCode::Enter => {
            app.set_status("Retrying…");
            spawn_refetch(app, event_tx);
        }
        _ => {}
    }
    Action::Continue
}

/// Grid-level keys.
fn handle_grid_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,

        KeyCode::Esc => {
            if app.mode == Mode::Select {
                app.exit_select_mode();
            }
        }

        // Cursor movement: one row is one column-count stride.
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor_by(app.grid.columns as isize),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor_by(-(app.grid.columns as isize)),
        KeyCode::Char('h') | KeyCode::Left => app.move_cursor_by(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_cursor_by(1),
        KeyCode::PageDown => app.scroll_by(i64::from(app.viewport_units)),
        KeyCode::PageUp => app.scroll_by(-i64::from(app.viewport_units)),
        KeyCode::Char('g') | KeyCode::Home => app.cursor_home(),
        KeyCode::Char('G') | KeyCode::End => app.cursor_end(),

        // Sort selection: the dropdown equivalent.
        KeyCode::Char('o') => change_sort(app, app.sort.next(), event_tx),
        KeyCode::Char('1') => change_sort(app, SortType::Recent, event_tx),
        KeyCode::Char('2') => change_sort(app, SortType::Oldest, event_tx),
        KeyCode::Char('3') => change_sort(app, SortType::Brand, event_tx),

        // Select mode toggle: the floating button equivalent.
        KeyCode::Char('v') => app.toggle_select_mode(),

        KeyCode::Char(' ') | KeyCode::Enter => activate_cursor_cell(app),

        KeyCode::Char('f') => {
            if let Some(feed) = app.cursor_feed() {
                spawn_toggle_favorite(app, event_tx, feed.id);
            }
        }

        KeyCode::Char('r') => {
            // Manual retry for an errored cell; unlimited.
            if let Some(feed) = app.cursor_feed() {
                let id = feed.id;
                if app.cells.phase(id) == crate::image::CellPhase::Errored {
                    app.cells.manual_retry(id);
                    app.needs_redraw = true;
                }
            }
        }

        KeyCode::Char('d') => {
            if app.mode == Mode::Select && submit_delete_selected(app, event_tx) {
                app.set_status("Deleting…");
            }
        }

        KeyCode::Char('a') => {
            if app.mode == Mode::Select {
                if app.selection.is_empty() {
                    app.open_alert("Select photos to add first.");
                } else {
                    app.album_modal = Some(AlbumModal::Add { selected: 0 });
                    if app.store.albums().is_none() {
                        spawn_albums_load(app, event_tx);
                    }
                    app.needs_redraw = true;
                }
            }
        }

        KeyCode::Char('n') => {
            if app.mode == Mode::Select {
                app.album_modal = Some(AlbumModal::Create {
                    title: String::new(),
                });
                app.needs_redraw = true;
            }
        }

        _ => {}
    }
    Action::Continue
}

fn change_sort(app: &mut App, sort: SortType, event_tx: &mpsc::Sender<AppEvent>) {
    if sort == app.sort && app.phase == FeedsPhase::Ready {
        return;
    }
    app.set_sort(sort);
    spawn_page_fetch(app, event_tx);
}

/// Space/Enter on the cursor cell: toggle selection in select mode, open
/// the feed otherwise (detail routing is outside this client).
fn activate_cursor_cell(app: &mut App) {
    let Some(feed) = app.cursor_feed() else {
        return;
    };
    let id = feed.id;
    match app.mode {
        Mode::Select => app.toggle_selection(id),
        Mode::Default => app.set_status(format!("Feed {}", id)),
    }
}

/// Album modal input (create title entry or album picker).
fn handle_modal_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    let Some(modal) = app.album_modal.clone() else {
        return Action::Continue;
    };
    match modal {
        AlbumModal::Create { mut title } => match code {
            KeyCode::Esc => {
                // Modal cancellation leaves select mode and drops the draft.
                app.finish_batch_action();
            }
            KeyCode::Enter => {
                // Fail-fast validation lives in submit_create_album: a
                // blank title or empty selection alerts without a request.
                if submit_create_album(app, event_tx, &title) {
                    app.set_status("Creating album…");
                }
            }
            KeyCode::Backspace => {
                title.pop();
                app.album_modal = Some(AlbumModal::Create { title });
                app.needs_redraw = true;
            }
            KeyCode::Char(c) => {
                title.push(c);
                app.album_modal = Some(AlbumModal::Create { title });
                app.needs_redraw = true;
            }
            _ => {}
        },
        AlbumModal::Add { selected } => match code {
            KeyCode::Esc => {
                app.finish_batch_action();
            }
            KeyCode::Char('n') => {
                app.album_modal = Some(AlbumModal::Create {
                    title: String::new(),
                });
                app.needs_redraw = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let count = app.store.albums().map(<[_]>::len).unwrap_or(0);
                if count > 0 {
                    app.album_modal = Some(AlbumModal::Add {
                        selected: (selected + 1).min(count - 1),
                    });
                    app.needs_redraw = true;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.album_modal = Some(AlbumModal::Add {
                    selected: selected.saturating_sub(1),
                });
                app.needs_redraw = true;
            }
            KeyCode::Enter => {
                let album_id = app
                    .store
                    .albums()
                    .and_then(|albums| albums.get(selected))
                    .map(|album| album.album_id);
                if let Some(album_id) = album_id {
                    if submit_add_to_album(app, event_tx, album_id) {
                        app.set_status("Adding to album…");
                    }
                }
            }
            _ => {}
        },
    }
    Action::Continue
}

/// Mouse input: clicks, holds, and wheel scrolling.
pub(super) fn handle_mouse(
    app: &mut App,
    mouse: MouseEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let cell = app
                .grid_screen
                .and_then(|screen| screen.cell_at(&app.grid, mouse.column, mouse.row));
            start_long_press(app, event_tx, cell);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(state) = end_long_press(app) {
                // A fired press already switched modes; a short press is a
                // click on the cell it started over.
                if !state.fired {
                    if let Some(index) = state.cell {
                        if index < app.feeds.len() {
                            app.cursor = index;
                            activate_cursor_cell(app);
                        }
                    }
                }
            }
        }
        // Moving off the press point is a drag, not a hold.
        MouseEventKind::Drag(MouseButton::Left) => cancel_long_press(app),
        MouseEventKind::ScrollDown => app.scroll_by(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_by(-WHEEL_STEP),
        _ => {}
    }
    Action::Continue
}
