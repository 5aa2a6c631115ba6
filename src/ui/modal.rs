//! Centered overlay dialogs: the alert and the album create/add modals.

use crate::app::{AlbumModal, App};
use ratatui::{
    layout::{Alignment, Rect},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Center a `width`×`height` box inside `area`, clamped to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Dismissible alert — the surface for every mutation outcome.
pub(super) fn render_alert(f: &mut Frame, app: &App, message: &str) {
    let area = f.area();
    let overlay = centered_rect(area, 44, 7);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(format!("{}\n\n(Enter) Dismiss", message))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("alert_border"))
                .title(" Notice "),
        )
        .alignment(Alignment::Center)
        .style(app.style("modal_text"));
    f.render_widget(paragraph, overlay);
}

/// Album create/add dialogs, rendered over the grid.
pub(super) fn render_album_modal(f: &mut Frame, app: &App, modal: &AlbumModal) {
    let area = f.area();

    let (title, text) = match modal {
        AlbumModal::Create { title } => (
            " New Album ",
            format!(
                "Album title ({} photos selected):\n\n> {}_\n\n(Enter) Create  (Esc) Cancel",
                app.selection.len(),
                title
            ),
        ),
        AlbumModal::Add { selected } => {
            let body = match app.store.albums() {
                None => "Loading albums…".to_string(),
                Some([]) => "No albums yet — press n to create one.".to_string(),
                Some(albums) => albums
                    .iter()
                    .enumerate()
                    .map(|(i, album)| {
                        if i == *selected {
                            format!("> {}", album.title)
                        } else {
                            format!("  {}", album.title)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            (
                " Add to Album ",
                format!("{}\n\n(Enter) Add  (n) New album  (Esc) Cancel", body),
            )
        }
    };

    let content_lines = text.lines().count() as u16 + 2;
    let overlay = centered_rect(area, 48, content_lines);
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("modal_border"))
                .title(title),
        )
        .style(app.style("modal_text"));
    f.render_widget(paragraph, overlay);
}
