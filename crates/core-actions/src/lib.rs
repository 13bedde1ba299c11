//! Key translation and dispatch.
//!
//! Two stages keep the mapping testable in isolation: `translate` turns a
//! logical key into an `Action` (a pure table, no state), and `dispatch`
//! applies the action to the editor state, returning a `Flow` verdict so the
//! main loop knows when control leaves normal mode (save, find, quit).
//!
//! Cursor arithmetic lives here and nowhere else: the buffer exposes dumb
//! splice/join/split operations, and the dispatcher decides where the cursor
//! lands afterwards. The synthetic past-last-line row (`y == line_count`) is
//! legal for the cursor but guarded before every buffer read.

use core_events::{BACKSPACE, Key, ctrl};
use core_state::{EditorState, Viewport};

pub mod search;

/// What one key event asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Insert a printable byte (or tab) at the cursor.
    Insert(u8),
    InsertNewline,
    /// Backspace / Ctrl-H: delete the character left of the cursor.
    DeleteBack,
    /// Delete key: virtual right-arrow, then converge on `DeleteBack`.
    DeleteForward,
    Move(Direction),
    Page(Direction),
    LineStart,
    LineEnd,
    Save,
    Find,
    Quit,
    /// Swallowed: bare ESC, unmapped control bytes.
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Control-flow verdict returned to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Serialize the buffer (prompting for a name first if unnamed).
    Save,
    /// Open the search prompt.
    Find,
    Quit,
}

/// Map a logical key to its action. Every key maps to exactly one action;
/// unrecognized input maps to `Nop` rather than an error.
pub fn translate(key: Key) -> Action {
    match key {
        Key::Byte(b'\r') => Action::InsertNewline,
        Key::Byte(b) if b == ctrl(b'q') => Action::Quit,
        Key::Byte(b) if b == ctrl(b's') => Action::Save,
        Key::Byte(b) if b == ctrl(b'f') => Action::Find,
        Key::Byte(BACKSPACE) => Action::DeleteBack,
        Key::Byte(b) if b == ctrl(b'h') => Action::DeleteBack,
        Key::Delete => Action::DeleteForward,
        Key::ArrowUp => Action::Move(Direction::Up),
        Key::ArrowDown => Action::Move(Direction::Down),
        Key::ArrowLeft => Action::Move(Direction::Left),
        Key::ArrowRight => Action::Move(Direction::Right),
        Key::Home => Action::LineStart,
        Key::End => Action::LineEnd,
        Key::PageUp => Action::Page(Direction::Up),
        Key::PageDown => Action::Page(Direction::Down),
        Key::Byte(b) if key.is_printable() => Action::Insert(b),
        _ => Action::Nop,
    }
}

/// Apply `action` to the editor. The viewport is read-only here: page moves
/// need its offsets, but scrolling itself happens at frame time.
pub fn dispatch(action: Action, state: &mut EditorState, viewport: &Viewport) -> Flow {
    tracing::trace!(target: "actions.dispatch", ?action, cursor = ?state.cursor, "dispatch");
    match action {
        Action::Insert(b) => insert_char(state, b),
        Action::InsertNewline => insert_newline(state),
        Action::DeleteBack => delete_char(state),
        Action::DeleteForward => {
            move_cursor(state, Direction::Right);
            delete_char(state);
        }
        Action::Move(direction) => move_cursor(state, direction),
        Action::Page(direction) => page_move(state, viewport, direction),
        Action::LineStart => state.cursor.x = 0,
        Action::LineEnd => {
            if state.cursor.y < state.buffer.line_count() {
                state.cursor.x = state.current_line_len();
            }
        }
        Action::Save => return Flow::Save,
        Action::Find => return Flow::Find,
        Action::Quit => return Flow::Quit,
        Action::Nop => {}
    }
    Flow::Continue
}

fn insert_char(state: &mut EditorState, b: u8) {
    if state.cursor.y == state.buffer.line_count() {
        state.buffer.append_line("");
    }
    state.buffer.insert_char(state.cursor.x, state.cursor.y, b);
    state.cursor.x += 1;
    state.dirty = true;
}

fn insert_newline(state: &mut EditorState) {
    let (x, y) = (state.cursor.x, state.cursor.y);
    state.cursor.x = 0;
    state.cursor.y += 1;
    state.buffer.split_line(x, y);
    state.dirty = true;
}

/// Backspace semantics at the cursor; both delete keys converge here. The
/// join point on the previous row is captured before the rows merge.
fn delete_char(state: &mut EditorState) {
    let (x, y) = (state.cursor.x, state.cursor.y);
    if y == state.buffer.line_count() {
        return;
    }
    if x == 0 && y == 0 {
        return;
    }
    if x > 0 {
        state.buffer.delete_char(x, y);
        state.cursor.x = x - 1;
    } else {
        let join_x = state.buffer.line_len(y - 1);
        state.buffer.delete_char(0, y);
        state.cursor.x = join_x;
        state.cursor.y = y - 1;
    }
    state.dirty = true;
}

/// Single-step cursor motion with the clamping rules: Left stops at column
/// zero, Right stops at line end (and past the last row), Up/Down clamp the
/// column to the destination line's length.
pub fn move_cursor(state: &mut EditorState, direction: Direction) {
    let line_count = state.buffer.line_count();
    match direction {
        Direction::Left => {
            if state.cursor.x != 0 {
                state.cursor.x -= 1;
            }
        }
        Direction::Right => {
            if state.cursor.y < line_count && state.cursor.x < state.current_line_len() {
                state.cursor.x += 1;
            }
        }
        Direction::Up => {
            if state.cursor.y != 0 {
                state.cursor.y -= 1;
                clamp_x(state);
            }
        }
        Direction::Down => {
            if state.cursor.y < line_count {
                state.cursor.y += 1;
                clamp_x(state);
            }
        }
    }
}

fn clamp_x(state: &mut EditorState) {
    let len = state.current_line_len();
    if state.cursor.x > len {
        state.cursor.x = len;
    }
}

/// Page moves jump to the viewport's top/bottom row and then replay one
/// screenful of single-step moves, inheriting their clamping behavior row by
/// row at the buffer edges.
fn page_move(state: &mut EditorState, viewport: &Viewport, direction: Direction) {
    match direction {
        Direction::Up => state.cursor.y = viewport.row_offset,
        Direction::Down => {
            state.cursor.y = (viewport.row_offset + viewport.rows).saturating_sub(1);
            if state.cursor.y > state.buffer.line_count() {
                state.cursor.y = state.buffer.line_count();
            }
        }
        Direction::Left | Direction::Right => return,
    }
    for _ in 0..viewport.rows {
        move_cursor(state, direction);
    }
}
