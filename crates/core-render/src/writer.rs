//! Frame accumulator: every escape sequence and text run for one frame is
//! collected into a single buffer, then handed to the output sink in exactly
//! one write + flush. Nothing is flushed mid-frame, so a slow terminal never
//! shows a half-drawn screen.
//!
//! Escape sequences come from crossterm's typed commands serialized with
//! `Command::write_ansi` instead of hand-rolled `\x1b[` literals; writing
//! into a `String` cannot fail, so accumulation is infallible and only the
//! final write is.

use anyhow::Result;
use crossterm::{
    Command,
    cursor::{Hide, MoveTo, Show},
    style::{Attribute, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::Write;

/// Reusable per-frame output accumulator. The buffer's allocation survives
/// across frames; `begin_frame` only resets its length.
#[derive(Debug, Default)]
pub struct FrameWriter {
    buf: String,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, cmd: impl Command) {
        // Infallible for a String target.
        let _ = cmd.write_ansi(&mut self.buf);
    }

    pub fn begin_frame(&mut self) {
        self.buf.clear();
    }

    pub fn hide_cursor(&mut self) {
        self.push(Hide);
    }

    pub fn show_cursor(&mut self) {
        self.push(Show);
    }

    /// Move to the top-left corner.
    pub fn move_home(&mut self) {
        self.push(MoveTo(0, 0));
    }

    /// Place the terminal cursor at 0-indexed screen coordinates.
    pub fn move_to(&mut self, col: u16, row: u16) {
        self.push(MoveTo(col, row));
    }

    /// Erase from the current position to the end of the line.
    pub fn clear_line_tail(&mut self) {
        self.push(Clear(ClearType::UntilNewLine));
    }

    pub fn reverse_video(&mut self) {
        self.push(SetAttribute(Attribute::Reverse));
    }

    pub fn reset_attributes(&mut self) {
        self.push(SetAttribute(Attribute::Reset));
    }

    pub fn print(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Raw-mode line break: carriage return + line feed.
    pub fn newline(&mut self) {
        self.buf.push_str("\r\n");
    }

    /// The composed frame so far (tests assert on this).
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Emit the whole frame as one write, then flush.
    pub fn flush_to<W: Write>(&mut self, out: &mut W) -> Result<()> {
        out.write_all(self.buf.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
