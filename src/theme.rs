//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes,
//! and `StyleMap` resolves role names to concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }
}

// ============================================================================
// Color Palette — semantic roles to Style
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Grid cells --
    pub cell_pending: Style,
    pub cell_loading: Style,
    pub cell_loaded: Style,
    pub cell_errored: Style,
    pub cell_placeholder: Style,
    pub cell_cursor: Style,
    pub cell_selected: Style,
    pub favorite_on: Style,
    pub favorite_off: Style,

    // -- Chrome --
    pub header: Style,
    pub brand_label: Style,
    pub status_bar: Style,
    pub sentinel: Style,

    // -- Overlays --
    pub modal_border: Style,
    pub modal_text: Style,
    pub alert_border: Style,
    pub error_screen: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            cell_pending: Style::default().fg(Color::DarkGray),
            cell_loading: Style::default().fg(Color::Gray),
            cell_loaded: Style::default().fg(Color::White),
            cell_errored: Style::default().fg(Color::Red),
            cell_placeholder: Style::default().fg(Color::Black),
            cell_cursor: Style::default().fg(Color::Cyan),
            cell_selected: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            favorite_on: Style::default().fg(Color::Yellow),
            favorite_off: Style::default().fg(Color::DarkGray),

            header: Style::default().add_modifier(Modifier::BOLD),
            brand_label: Style::default().fg(Color::Cyan),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            sentinel: Style::default().fg(Color::DarkGray),

            modal_border: Style::default().fg(Color::Cyan),
            modal_text: Style::default(),
            alert_border: Style::default().fg(Color::Yellow),
            error_screen: Style::default().fg(Color::Red),
        }
    }

    fn light() -> Self {
        Self {
            cell_pending: Style::default().fg(Color::Gray),
            cell_loading: Style::default().fg(Color::DarkGray),
            cell_loaded: Style::default().fg(Color::Black),
            cell_errored: Style::default().fg(Color::Red),
            cell_placeholder: Style::default().fg(Color::White),
            cell_cursor: Style::default().fg(Color::Blue),
            cell_selected: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            favorite_on: Style::default().fg(Color::Yellow),
            favorite_off: Style::default().fg(Color::Gray),

            header: Style::default().add_modifier(Modifier::BOLD),
            brand_label: Style::default().fg(Color::Blue),
            status_bar: Style::default().bg(Color::Gray).fg(Color::Black),
            sentinel: Style::default().fg(Color::Gray),

            modal_border: Style::default().fg(Color::Blue),
            modal_text: Style::default(),
            alert_border: Style::default().fg(Color::Yellow),
            error_screen: Style::default().fg(Color::Red),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// Role name → style lookup used by all rendering code.
///
/// Unknown roles resolve to the default style rather than panicking.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

impl StyleMap {
    pub fn from_palette(palette: &ColorPalette) -> Self {
        let mut map = HashMap::new();
        map.insert("cell_pending", palette.cell_pending);
        map.insert("cell_loading", palette.cell_loading);
        map.insert("cell_loaded", palette.cell_loaded);
        map.insert("cell_errored", palette.cell_errored);
        map.insert("cell_placeholder", palette.cell_placeholder);
        map.insert("cell_cursor", palette.cell_cursor);
        map.insert("cell_selected", palette.cell_selected);
        map.insert("favorite_on", palette.favorite_on);
        map.insert("favorite_off", palette.favorite_off);
        map.insert("header", palette.header);
        map.insert("brand_label", palette.brand_label);
        map.insert("status_bar", palette.status_bar);
        map.insert("sentinel", palette.sentinel);
        map.insert("modal_border", palette.modal_border);
        map.insert("modal_text", palette.modal_text);
        map.insert("alert_border", palette.alert_border);
        map.insert("error_screen", palette.error_screen);
        Self { map }
    }

    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!(ThemeVariant::from_str_name("Dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("LIGHT"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("sepia"), None);
    }

    #[test]
    fn test_unknown_role_resolves_to_default() {
        let styles = StyleMap::from_palette(&ThemeVariant::Dark.palette());
        assert_eq!(styles.resolve("nonexistent_role"), Style::default());
        assert_ne!(styles.resolve("cell_errored"), Style::default());
    }
}
