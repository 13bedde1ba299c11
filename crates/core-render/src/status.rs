//! Status and message bar composition.
//!
//! Kept separate from frame assembly so the exact text — truncation,
//! padding, right-alignment — is testable as plain strings without any
//! escape sequences in the way. The renderer wraps the status line in
//! reverse video and appends the message bar beneath it.

use std::path::Path;

/// What the status bar needs to know; a plain DTO so callers do not hand the
/// renderer their whole state.
pub struct StatusContext<'a> {
    pub file_name: Option<&'a Path>,
    pub dirty: bool,
    pub line_count: usize,
    /// 0-based cursor row; displayed 1-based.
    pub cursor_row: usize,
}

/// Longest filename prefix shown before truncation.
const FILE_NAME_WIDTH: usize = 20;

/// Compose the status line padded with spaces to exactly `cols` columns:
/// left-aligned `<name> - <N> lines`, optional `(modified)` marker, and the
/// current-row indicator flush right. When the two sides would collide the
/// right side is dropped rather than overlapped.
pub fn build_status_bar(ctx: &StatusContext<'_>, cols: usize) -> String {
    let name = ctx
        .file_name
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "[No Name]".to_string());
    let shown: String = name.chars().take(FILE_NAME_WIDTH).collect();

    let mut left = format!("{} - {} lines", shown, ctx.line_count);
    if ctx.dirty {
        left.push_str(" (modified)");
    }
    left.truncate(cols);

    let right = format!("{}/{}", ctx.cursor_row + 1, ctx.line_count);

    let mut bar = left;
    while bar.len() < cols {
        if cols - bar.len() == right.len() {
            bar.push_str(&right);
        } else {
            bar.push(' ');
        }
    }
    bar
}

/// Compose the message bar: the text as-is, truncated to `cols - 1` only
/// when it overflows the screen width.
pub fn build_message_bar(message: Option<&str>, cols: usize) -> String {
    let msg = message.unwrap_or("");
    if msg.len() > cols {
        msg[..cols.saturating_sub(1)].to_string()
    } else {
        msg.to_string()
    }
}
