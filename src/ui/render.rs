//! Render functions for the TUI.
//!
//! The grid view maps abstract scroll units onto terminal cells: each grid
//! row paints as a fixed number of terminal rows, and the viewport size in
//! units is written back to `App` every frame so scroll clamping and the
//! image-cell proximity gate work from real geometry.

use crate::app::{App, FeedsPhase, GridScreen, Mode};
use crate::image::CellPhase;
use crate::util::{format_size, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::modal;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 48;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Terminal rows used to paint one grid row (border + two content lines +
/// border shared with the next row).
const CELL_TERM_HEIGHT: u16 = 4;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    match app.phase.clone() {
        FeedsPhase::Loading => render_loading(f, app),
        FeedsPhase::Error(message) => render_error(f, app, &message),
        FeedsPhase::Ready => render_grid_view(f, app),
    }

    if let Some(album_modal) = app.album_modal.clone() {
        modal::render_album_modal(f, app, &album_modal);
    }

    if let Some(message) = app.alert.clone() {
        modal::render_alert(f, app, &message);
    }
}

/// Full-screen loading state shown before the first page arrives.
fn render_loading(f: &mut Frame, app: &App) {
    let paragraph = Paragraph::new("Loading your photos…")
        .alignment(Alignment::Center)
        .style(app.style("header"));
    f.render_widget(paragraph, centered_line(f.area()));
}

/// Full-screen error state — a failed page load never renders partially.
fn render_error(f: &mut Frame, app: &App, message: &str) {
    let text = format!(
        "Could not load the feed\n\n{}\n\n(r) Retry   (q) Quit",
        message
    );
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(app.style("error_screen"));
    f.render_widget(paragraph, f.area());
}

fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y, area.width, 1)
}

fn render_grid_view(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_grid(f, app, chunks[1]);
    render_status(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let left = match app.mode {
        Mode::Default => format!(
            " mosaic · {} · {} photos   [1/2/3] sort  [v] select",
            app.sort.label(),
            app.feeds.len()
        ),
        Mode::Select => format!(
            " SELECT · {} chosen   [Space] pick  [a] album  [n] new  [d] delete  [Esc] done",
            app.selection.len()
        ),
    };
    let style = match app.mode {
        Mode::Default => app.style("header"),
        Mode::Select => app.style("cell_selected"),
    };
    f.render_widget(Paragraph::new(left).style(style), area);
}

/// Paint the visible band of the thumbnail grid and record the on-screen
/// geometry for mouse mapping.
fn render_grid(f: &mut Frame, app: &mut App, area: Rect) {
    // Viewport in grid units, from whole visible grid rows.
    let visible_rows = area.height / CELL_TERM_HEIGHT;
    app.viewport_units = u32::from(visible_rows) * crate::grid::CELL_SIZE;
    app.scroll_offset = app
        .grid
        .clamp_scroll(app.scroll_offset, app.feeds.len(), app.viewport_units);

    let cell_width = area.width / app.grid.columns as u16;
    let first_row = (app.scroll_offset / u64::from(app.grid.cell_size)) as usize;
    let total_rows = app.grid.row_count(app.feeds.len());

    app.grid_screen = Some(GridScreen {
        area,
        cell_width,
        cell_height: CELL_TERM_HEIGHT,
        first_row,
    });

    if app.feeds.is_empty() {
        let paragraph = Paragraph::new("No photos yet")
            .alignment(Alignment::Center)
            .style(app.style("cell_pending"));
        f.render_widget(paragraph, centered_line(area));
        return;
    }

    for screen_row in 0..usize::from(visible_rows) {
        let grid_row = first_row + screen_row;
        if grid_row >= total_rows {
            break;
        }
        for col in 0..app.grid.columns {
            let index = app.grid.cell_index(grid_row, col);
            let cell_area = Rect::new(
                area.x + cell_width * col as u16,
                area.y + CELL_TERM_HEIGHT * screen_row as u16,
                cell_width,
                CELL_TERM_HEIGHT,
            );
            // Indices past the collection render as empty placeholders.
            if index < app.feeds.len() {
                render_cell(f, app, cell_area, index);
            } else {
                f.render_widget(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(app.style("cell_placeholder")),
                    cell_area,
                );
            }
        }
    }
}

fn render_cell(f: &mut Frame, app: &mut App, area: Rect, index: usize) {
    let feed = app.feeds[index].clone();
    let selected = app.mode == Mode::Select && app.selection.contains(&feed.id);
    let is_cursor = index == app.cursor;

    let phase = app.cells.phase(feed.id);
    let (body, body_role) = if feed.thumbnail_url.is_none() {
        ("no image".to_string(), "cell_pending")
    } else {
        match phase {
            CellPhase::Pending => ("·".to_string(), "cell_pending"),
            CellPhase::Loading => ("loading".to_string(), "cell_loading"),
            CellPhase::PendingRetry { .. } => {
                let attempt = app.cells.retries_used(feed.id);
                (format!("retry {}/2", attempt), "cell_loading")
            }
            CellPhase::Loaded => {
                let label = app
                    .thumbnails
                    .size_of(feed.id)
                    .map(|len| format!("▓▓ {}", format_size(len)))
                    .unwrap_or_else(|| "▓▓".to_string());
                (label, "cell_loaded")
            }
            CellPhase::Errored => ("✕ [r]etry".to_string(), "cell_errored"),
        }
    };

    let star = if app.is_favorite(&feed) { "★" } else { "☆" };
    let star_role = if app.is_favorite(&feed) {
        "favorite_on"
    } else {
        "favorite_off"
    };
    let check = match app.mode {
        Mode::Select if selected => "[x] ",
        Mode::Select => "[ ] ",
        Mode::Default => "",
    };
    let label = feed
        .brand_name
        .clone()
        .unwrap_or_else(|| format!("#{}", feed.id));
    let inner_width = usize::from(area.width.saturating_sub(2));
    let title_line = format!(
        "{}{} {}",
        check,
        star,
        truncate_to_width(&label, inner_width.saturating_sub(check.len() + 2))
    );

    let border_role = if selected {
        "cell_selected"
    } else if is_cursor {
        "cell_cursor"
    } else {
        "cell_pending"
    };

    let lines = vec![
        Line::styled(title_line, app.style(star_role)),
        Line::styled(
            truncate_to_width(&body, inner_width),
            app.style(body_role),
        ),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style(border_role)),
    );
    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let text = if let Some((message, _)) = &app.status_message {
        message.to_string()
    } else if app.is_fetching() && !app.feeds.is_empty() {
        "Loading more…".to_string()
    } else if !app.has_next_page() && !app.feeds.is_empty() {
        format!("{} photos · end of feed", app.feeds.len())
    } else {
        "j/k move · f favorite · v select · q quit".to_string()
    };
    f.render_widget(Paragraph::new(text).style(app.style("status_bar")), area);
}
