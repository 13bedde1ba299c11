//! Line-oriented text buffer with a per-row display transform.
//!
//! The buffer owns two parallel sequences per row: the raw text as it exists
//! on disk, and a rendered form derived from it (currently: every tab becomes
//! exactly one space; everything else is copied through). Every mutation
//! re-derives the rendered form of the touched row before returning, so a
//! reader never observes the two out of sync.
//!
//! Coordinates are byte indices. A column may legitimately sit one past the
//! last character of its row (append position); a row index equal to
//! `line_count()` is the synthetic past-last-line position and must be
//! guarded by callers before any buffer read. Asking for the rendered form of
//! a row that does not exist is an invariant violation, not a user error, and
//! is surfaced as a typed error the caller treats as fatal.

use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BufferError {
    /// A read of a row index past the end of the buffer. Callers are expected
    /// to have clamped/guarded; hitting this is a logic bug upstream.
    #[error("no line {0}")]
    LineOutOfRange(usize),
}

/// A cursor location in buffer coordinates: `x` is a byte column within row
/// `y`'s raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0, y: 0 }
    }
}

/// One buffer row: raw on-disk text plus its display form.
#[derive(Debug, Clone, Default)]
struct Row {
    raw: String,
    render: String,
}

impl Row {
    fn new(raw: String) -> Self {
        let mut row = Self {
            raw,
            render: String::new(),
        };
        row.update_render();
        row
    }

    /// Re-derive the display form. Tab becomes a single space; no multi-column
    /// tab stops.
    fn update_render(&mut self) {
        self.render = self.raw.replace('\t', " ");
    }
}

/// Ordered sequence of rows; insertion order is on-disk order. An empty file
/// is an empty sequence, not a single empty row.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rows: Vec<Row>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a buffer line-by-line from a reader (trailing newlines are
    /// line separators, not row content).
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut buffer = Self::new();
        for line in reader.lines() {
            buffer.append_line(line?);
        }
        Ok(buffer)
    }

    /// Serialize every row followed by a newline. Returns the number of bytes
    /// written so callers can report it.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<usize> {
        let mut written = 0;
        for row in &self.rows {
            writer.write_all(row.raw.as_bytes())?;
            writer.write_all(b"\n")?;
            written += row.raw.len() + 1;
        }
        Ok(written)
    }

    pub fn line_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw text of row `y`, if it exists.
    pub fn line(&self, y: usize) -> Option<&str> {
        self.rows.get(y).map(|r| r.raw.as_str())
    }

    /// Raw byte length of row `y`; the synthetic past-last-line row has
    /// length zero.
    pub fn line_len(&self, y: usize) -> usize {
        self.rows.get(y).map_or(0, |r| r.raw.len())
    }

    /// Display form of row `y`. Out of range is an upstream invariant
    /// violation and therefore an error, not a clamp.
    pub fn rendered_line(&self, y: usize) -> Result<&str, BufferError> {
        self.rows
            .get(y)
            .map(|r| r.render.as_str())
            .ok_or(BufferError::LineOutOfRange(y))
    }

    /// Splice `ch` into row `y` at column `x`; columns out of `[0, len]`
    /// clamp to the end of the row.
    pub fn insert_char(&mut self, x: usize, y: usize, ch: u8) {
        let row = &mut self.rows[y];
        let x = x.min(row.raw.len());
        row.raw.insert(x, ch as char);
        row.update_render();
    }

    /// Backspace semantics at `(x, y)`: remove the character left of `x`, or
    /// join row `y` onto the end of row `y - 1` when `x` is zero. A delete at
    /// the buffer origin is a no-op.
    pub fn delete_char(&mut self, x: usize, y: usize) {
        if y >= self.rows.len() || x > self.rows[y].raw.len() {
            return;
        }
        if x > 0 {
            self.rows[y].raw.remove(x - 1);
            self.rows[y].update_render();
        } else if y > 0 {
            let tail = self.rows.remove(y);
            self.rows[y - 1].raw.push_str(&tail.raw);
            self.rows[y - 1].update_render();
        }
    }

    /// Enter-key semantics at `(x, y)`: a new row appears after `y` carrying
    /// `[x, end)` of the old content, and row `y` keeps `[0, x)`. At column
    /// zero this means an empty row takes index `y` and the old content
    /// shifts down intact. Splitting the synthetic past-last-line row appends
    /// an empty row.
    pub fn split_line(&mut self, x: usize, y: usize) {
        if y >= self.rows.len() {
            self.rows.push(Row::default());
            return;
        }
        if x == 0 {
            self.rows.insert(y, Row::default());
        } else {
            let x = x.min(self.rows[y].raw.len());
            let tail = self.rows[y].raw.split_off(x);
            self.rows[y].update_render();
            self.rows.insert(y + 1, Row::new(tail));
        }
    }

    /// Insert a new row at end-of-buffer.
    pub fn append_line(&mut self, text: impl Into<String>) {
        self.rows.push(Row::new(text.into()));
    }

    /// Linear forward scan for the first raw-text substring match, starting
    /// at row `from_row` and never wrapping back to the start. Returns the
    /// match position in buffer coordinates.
    pub fn search_forward(&self, query: &str, from_row: usize) -> Option<Position> {
        if query.is_empty() {
            return None;
        }
        for (offset, row) in self.rows.iter().enumerate().skip(from_row) {
            if let Some(x) = row.raw.find(query) {
                return Some(Position::new(x, offset));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(lines: &[&str]) -> TextBuffer {
        let mut b = TextBuffer::new();
        for l in lines {
            b.append_line(*l);
        }
        b
    }

    #[test]
    fn empty_file_is_empty_sequence() {
        let b = TextBuffer::new();
        assert_eq!(b.line_count(), 0);
        assert!(b.is_empty());
        assert!(b.line(0).is_none());
        assert_eq!(b.line_len(0), 0);
    }

    #[test]
    fn render_replaces_tab_with_single_space() {
        let b = buffer(&["a\tb\tc"]);
        let rendered = b.rendered_line(0).unwrap();
        assert_eq!(rendered, "a b c");
        assert_eq!(rendered.len(), b.line_len(0));
        assert!(!rendered.contains('\t'));
    }

    #[test]
    fn rendered_line_out_of_range_is_an_error() {
        let b = buffer(&["only"]);
        assert!(matches!(
            b.rendered_line(1),
            Err(BufferError::LineOutOfRange(1))
        ));
    }

    #[test]
    fn insert_clamps_column_to_row_end() {
        let mut b = buffer(&["ab"]);
        b.insert_char(99, 0, b'c');
        assert_eq!(b.line(0), Some("abc"));
    }

    #[test]
    fn insert_then_delete_restores_row() {
        let mut b = buffer(&["hello"]);
        b.insert_char(2, 0, b'X');
        assert_eq!(b.line(0), Some("heXllo"));
        b.delete_char(3, 0);
        assert_eq!(b.line(0), Some("hello"));
        assert_eq!(b.rendered_line(0).unwrap(), "hello");
    }

    #[test]
    fn split_then_join_restores_row() {
        let mut b = buffer(&["hello world"]);
        b.split_line(5, 0);
        assert_eq!(b.line(0), Some("hello"));
        assert_eq!(b.line(1), Some(" world"));
        b.delete_char(0, 1);
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line(0), Some("hello world"));
    }

    #[test]
    fn split_at_column_zero_shifts_content_down() {
        let mut b = buffer(&["keep"]);
        b.split_line(0, 0);
        assert_eq!(b.line(0), Some(""));
        assert_eq!(b.line(1), Some("keep"));
    }

    #[test]
    fn split_past_last_line_appends_empty_row() {
        let mut b = buffer(&["one"]);
        b.split_line(0, 1);
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(1), Some(""));
    }

    #[test]
    fn delete_at_origin_is_noop() {
        let mut b = buffer(&["ab"]);
        b.delete_char(0, 0);
        assert_eq!(b.line(0), Some("ab"));
        assert_eq!(b.line_count(), 1);
    }

    #[test]
    fn delete_at_column_zero_joins_rows() {
        let mut b = buffer(&["ab", "cd"]);
        b.delete_char(0, 1);
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line(0), Some("abcd"));
        assert_eq!(b.rendered_line(0).unwrap(), "abcd");
    }

    #[test]
    fn search_scans_forward_from_row_without_wrapping() {
        let b = buffer(&["foo", "bar baz", "qux"]);
        assert_eq!(b.search_forward("baz", 0), Some(Position::new(4, 1)));
        assert_eq!(b.search_forward("foo", 1), None);
        assert_eq!(b.search_forward("qux", 1), Some(Position::new(0, 2)));
    }

    #[test]
    fn search_matches_raw_text_not_render() {
        let b = buffer(&["a\tb"]);
        assert_eq!(b.search_forward("\tb", 0), Some(Position::new(1, 0)));
        assert_eq!(b.search_forward(" b", 0), None);
    }

    #[test]
    fn search_empty_query_finds_nothing() {
        let b = buffer(&["anything"]);
        assert_eq!(b.search_forward("", 0), None);
    }
}
