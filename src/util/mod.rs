//! Small shared helpers for the UI layer.

use unicode_width::UnicodeWidthChar;

/// Truncate `text` to at most `max_width` terminal columns, appending `…`
/// when anything was cut. Width-aware so wide glyphs never overflow a cell.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let total: usize = text.chars().map(|ch| ch.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        // One column stays reserved for the ellipsis.
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Human-readable byte count for the loaded-cell label.
pub fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1}M", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}k", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}
