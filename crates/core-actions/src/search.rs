//! Forward search with navigation-state save/restore.
//!
//! The controller snapshots the view before opening the search prompt. A
//! cancelled or empty query restores the snapshot exactly; a query with no
//! match does too, instead of leaving the viewport wherever the scan ended.
//! Only a real match moves the cursor, and the next frame's scroll brings it
//! into view.

use core_state::{EditorState, Viewport};
use core_text::Position;

/// Cursor plus scroll offsets captured before a search prompt opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSnapshot {
    cursor: Position,
    row_offset: usize,
    col_offset: usize,
}

impl ViewSnapshot {
    pub fn capture(state: &EditorState, viewport: &Viewport) -> Self {
        Self {
            cursor: state.cursor,
            row_offset: viewport.row_offset,
            col_offset: viewport.col_offset,
        }
    }

    pub fn restore(&self, state: &mut EditorState, viewport: &mut Viewport) {
        state.cursor = self.cursor;
        viewport.row_offset = self.row_offset;
        viewport.col_offset = self.col_offset;
    }
}

/// Scan raw text from the cursor's row to the end of the buffer (no wrap)
/// and jump to the first substring match. Returns whether the cursor moved.
pub fn jump_to_match(state: &mut EditorState, query: &str) -> bool {
    match state.buffer.search_forward(query, state.cursor.y) {
        Some(position) => {
            tracing::debug!(target: "actions.search", ?position, "match");
            state.cursor = position;
            true
        }
        None => {
            tracing::debug!(target: "actions.search", "no_match");
            false
        }
    }
}
