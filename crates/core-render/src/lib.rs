//! Full-frame renderer.
//!
//! Each refresh composes the complete screen — text rows, status bar,
//! message bar, cursor placement — into the frame accumulator and then emits
//! it as one write. Composition is deterministic: the same state renders to
//! byte-identical frames, which the tests rely on.
//!
//! Screen geometry: the viewport's `rows`/`cols` describe the text area; the
//! status bar and message bar occupy the two terminal rows beneath it. The
//! caller keeps the viewport sized to `terminal rows - 2`.

use anyhow::Result;
use core_state::{EditorState, Viewport};
use std::io::Write;
use std::time::Instant;

pub mod status;
pub mod writer;

pub use status::{StatusContext, build_message_bar, build_status_bar};
pub use writer::FrameWriter;

/// Shown centered on row `rows / 3` of an empty buffer.
const VERSION_BANNER: &str = concat!("Tilde editor -- version ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
pub struct Renderer {
    writer: FrameWriter,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose one frame and flush it to `out` in a single write. `now` is
    /// the message-expiry reference instant.
    pub fn refresh<W: Write>(
        &mut self,
        out: &mut W,
        state: &EditorState,
        viewport: &Viewport,
        now: Instant,
    ) -> Result<()> {
        self.compose(state, viewport, now)?;
        self.writer.flush_to(out)
    }

    /// Compose a frame without emitting it; returns the payload. Tests call
    /// this directly to assert on frame bytes.
    pub fn compose(
        &mut self,
        state: &EditorState,
        viewport: &Viewport,
        now: Instant,
    ) -> Result<&str> {
        let w = &mut self.writer;
        w.begin_frame();
        w.hide_cursor();
        w.move_home();

        draw_rows(w, state, viewport)?;
        draw_status_bar(w, state, viewport);
        draw_message_bar(w, state, viewport, now);

        // 1-indexed on the wire; the writer takes 0-indexed coordinates.
        w.move_to(
            (state.cursor.x - viewport.col_offset) as u16,
            (state.cursor.y - viewport.row_offset) as u16,
        );
        w.show_cursor();
        Ok(w.as_str())
    }
}

fn draw_rows(w: &mut FrameWriter, state: &EditorState, viewport: &Viewport) -> Result<()> {
    for row in 0..viewport.rows {
        let file_row = row + viewport.row_offset;
        if file_row >= state.buffer.line_count() {
            if state.buffer.is_empty() && row == viewport.rows / 3 {
                draw_banner(w, viewport.cols);
            } else {
                w.print("~");
            }
        } else {
            let rendered = state.buffer.rendered_line(file_row)?;
            let start = viewport.col_offset.min(rendered.len());
            let end = (viewport.col_offset + viewport.cols).min(rendered.len());
            w.print(&rendered[start..end]);
        }
        w.clear_line_tail();
        w.newline();
    }
    Ok(())
}

fn draw_banner(w: &mut FrameWriter, cols: usize) {
    let banner = &VERSION_BANNER[..VERSION_BANNER.len().min(cols)];
    let mut padding = cols.saturating_sub(banner.len()) / 2;
    if padding > 0 {
        w.print("~");
        padding -= 1;
    }
    for _ in 0..padding {
        w.print(" ");
    }
    w.print(banner);
}

fn draw_status_bar(w: &mut FrameWriter, state: &EditorState, viewport: &Viewport) {
    let ctx = StatusContext {
        file_name: state.file_name.as_deref(),
        dirty: state.dirty,
        line_count: state.buffer.line_count(),
        cursor_row: state.cursor.y,
    };
    w.reverse_video();
    w.print(&build_status_bar(&ctx, viewport.cols));
    w.reset_attributes();
    w.newline();
}

fn draw_message_bar(w: &mut FrameWriter, state: &EditorState, viewport: &Viewport, now: Instant) {
    w.clear_line_tail();
    w.print(&build_message_bar(state.status.current(now), viewport.cols));
}
