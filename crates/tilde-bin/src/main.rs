//! Tilde entrypoint: terminal session setup and the controller loop.
//!
//! The loop is strictly synchronous with exactly one blocking point, the
//! keystroke read. Each iteration re-polls the terminal size, recomputes the
//! scroll offsets, flushes one composed frame, then reads and dispatches one
//! key. Prompt mode (save-as and search) is a nested loop of the same shape,
//! not a concurrent task.
//!
//! Every exit funnels through `main`: the raw-mode guard restores the
//! terminal (also on panic, via Drop), the screen is erased and homed, and
//! only then is an error printed. Exit code 0 for a user quit, 1 for any
//! fatal error.

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::search::{ViewSnapshot, jump_to_match};
use core_actions::{Flow, dispatch, translate};
use core_events::{BACKSPACE, Key, ctrl};
use core_input::KeyDecoder;
use core_render::Renderer;
use core_state::{EditorState, Viewport};
use core_terminal::{CrosstermBackend, clear_and_home, terminal_size};
use core_text::TextBuffer;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Terminal rows taken by the status bar and the message bar.
const BAR_ROWS: usize = 2;

const HELP_MESSAGE: &str = "HELP: Ctrl-F = find | Ctrl-S = save | Ctrl-Q = quit";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tilde", version, about = "Tilde editor")]
struct Args {
    /// Optional path to open at startup. A missing file starts an empty
    /// buffer under that name; it is created on the first save.
    pub path: Option<PathBuf>,
}

/// Where the per-frame terminal extent comes from. Production polls the
/// terminal before every frame (resize takes effect on the next redraw);
/// tests pin a fixed extent.
enum SizeSource {
    Terminal,
    Fixed(u16, u16),
}

impl SizeSource {
    /// `(columns, rows)`; failure is fatal per the error contract.
    fn get(&self) -> Result<(u16, u16)> {
        match self {
            SizeSource::Terminal => terminal_size(),
            SizeSource::Fixed(cols, rows) => Ok((*cols, *rows)),
        }
    }
}

/// The controller: owns every piece of editor state plus the input and
/// output ends of the terminal. Generic over both so tests can drive a whole
/// session from a byte script into a byte sink.
struct Editor<R, W> {
    state: EditorState,
    viewport: Viewport,
    renderer: Renderer,
    decoder: KeyDecoder<R>,
    out: W,
    size_source: SizeSource,
}

impl<R: Read, W: Write> Editor<R, W> {
    fn new(state: EditorState, input: R, out: W, size_source: SizeSource) -> Result<Self> {
        let (cols, rows) = size_source.get()?;
        let viewport = Viewport::new((rows as usize).saturating_sub(BAR_ROWS), cols as usize);
        Ok(Self {
            state,
            viewport,
            renderer: Renderer::new(),
            decoder: KeyDecoder::new(input),
            out,
            size_source,
        })
    }

    /// The main loop: frame, key, dispatch, repeat until quit.
    fn run(&mut self) -> Result<()> {
        loop {
            self.refresh()?;
            let key = self.decoder.read_key()?;
            match dispatch(translate(key), &mut self.state, &self.viewport) {
                Flow::Continue => {}
                Flow::Save => self.save()?,
                Flow::Find => self.find()?,
                Flow::Quit => {
                    info!(target: "runtime", "quit");
                    return Ok(());
                }
            }
        }
    }

    /// Re-poll the extent, restore cursor containment, emit one frame.
    fn refresh(&mut self) -> Result<()> {
        let (cols, rows) = self.size_source.get()?;
        self.viewport
            .resize((rows as usize).saturating_sub(BAR_ROWS), cols as usize);
        self.viewport.scroll(self.state.cursor);
        self.renderer
            .refresh(&mut self.out, &self.state, &self.viewport, Instant::now())
    }

    /// Nested synchronous prompt loop in the message bar. Printable bytes
    /// accumulate, Backspace edits, Enter resolves with the input, Esc
    /// cancels with `None`. The message is cleared either way.
    fn prompt(&mut self, prefix: &str) -> Result<Option<String>> {
        let mut input = String::new();
        loop {
            self.state.status.set(format!("{prefix}{input}"));
            self.refresh()?;
            let key = self.decoder.read_key()?;
            match key {
                Key::Esc => {
                    self.state.status.clear();
                    return Ok(None);
                }
                Key::Byte(b'\r') => {
                    self.state.status.clear();
                    return Ok(Some(input));
                }
                Key::Byte(BACKSPACE) => {
                    input.pop();
                }
                Key::Byte(b) if b == ctrl(b'h') => {
                    input.pop();
                }
                Key::Byte(b) if key.is_printable() => {
                    input.push(b as char);
                }
                _ => {}
            }
        }
    }

    /// Serialize the buffer to its file, prompting for a name first if the
    /// buffer is unnamed. A cancelled or empty prompt aborts the save.
    fn save(&mut self) -> Result<()> {
        if self.state.file_name.is_none() {
            match self.prompt("Save as: ")? {
                Some(name) if !name.is_empty() => {
                    self.state.file_name = Some(PathBuf::from(name));
                }
                _ => {
                    self.state.status.set("Save aborted");
                    return Ok(());
                }
            }
        }
        let Some(path) = self.state.file_name.clone() else {
            return Ok(());
        };
        let file = File::create(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        let mut writer = BufWriter::new(file);
        let written = self
            .state
            .buffer
            .write_to(&mut writer)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        self.state.dirty = false;
        info!(target: "io", file = %path.display(), bytes = written, "file_saved");
        self.state
            .status
            .set(format!("{written} bytes written to disk"));
        Ok(())
    }

    /// Search prompt: snapshot the view, ask for a query, jump to the first
    /// forward match. Empty query, cancel, and no-match all restore the
    /// snapshot, so the view never ends up somewhere the user did not go.
    fn find(&mut self) -> Result<()> {
        let snapshot = ViewSnapshot::capture(&self.state, &self.viewport);
        let query = self.prompt("Search: ")?.unwrap_or_default();
        if query.is_empty() {
            snapshot.restore(&mut self.state, &mut self.viewport);
            return Ok(());
        }
        if !jump_to_match(&mut self.state, &query) {
            snapshot.restore(&mut self.state, &mut self.viewport);
            self.state.status.set("Not found");
        }
        Ok(())
    }
}

/// Read the named file into a buffer. A missing file is not an error: the
/// editor starts empty under that name.
fn load_buffer(path: &Path) -> Result<TextBuffer> {
    match File::open(path) {
        Ok(file) => {
            let buffer = TextBuffer::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to read {}", path.display()))?;
            debug!(target: "io", file = %path.display(), lines = buffer.line_count(), "file_read_ok");
            Ok(buffer)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(target: "io", file = %path.display(), "file_missing_starting_empty");
            Ok(TextBuffer::new())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to open {}", path.display()))
        }
    }
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("tilde.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "tilde.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; drop the guard so the writer
        // thread shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Raw-mode session: everything between entering and restoring the terminal.
fn session(backend: &mut CrosstermBackend, args: &Args) -> Result<()> {
    let _guard = backend.enter_guard()?;

    let buffer = match args.path.as_ref() {
        Some(path) => load_buffer(path)?,
        None => TextBuffer::new(),
    };
    let mut state = EditorState::new(buffer);
    state.file_name = args.path.clone();
    state.status.set(HELP_MESSAGE);

    info!(
        target: "runtime.startup",
        path = args.path.as_ref().map(|p| p.display().to_string()).as_deref(),
        lines = state.buffer.line_count(),
        "session_start"
    );

    let mut editor = Editor::new(
        state,
        io::stdin(),
        io::stdout(),
        SizeSource::Terminal,
    )?;
    editor.run()
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let mut backend = CrosstermBackend::new();
    let result = session(&mut backend, &args);

    // Exit contract for both paths: erase, home, cooked mode, then speak.
    let _ = clear_and_home();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "runtime", error = %format!("{err:#}"), "fatal");
            eprintln!("tilde: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Position;

    /// Hands the decoder one keystroke per read, the way a terminal does;
    /// a plain `Cursor` would batch the whole script into a single read.
    struct ScriptReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ScriptReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Drive a whole session from a keystroke script, capturing frames in a
    /// byte sink. `Flow::Quit` (Ctrl-Q in the script) ends the run.
    fn scripted_session(
        lines: &[&str],
        file_name: Option<PathBuf>,
        script: &[u8],
    ) -> Editor<ScriptReader, Vec<u8>> {
        let mut buffer = TextBuffer::new();
        for l in lines {
            buffer.append_line(*l);
        }
        let mut state = EditorState::new(buffer);
        state.file_name = file_name;
        state.status.set(HELP_MESSAGE);
        let mut editor = Editor::new(
            state,
            ScriptReader {
                bytes: script.to_vec(),
                pos: 0,
            },
            Vec::new(),
            SizeSource::Fixed(80, 24),
        )
        .expect("fixed-size editor");
        editor.run().expect("session runs to quit");
        editor
    }

    #[test]
    fn viewport_reserves_rows_for_both_bars() {
        let editor = scripted_session(&[], None, &[ctrl(b'q')]);
        assert_eq!(editor.viewport.rows, 22);
        assert_eq!(editor.viewport.cols, 80);
    }

    #[test]
    fn typed_text_lands_in_buffer_and_frames_reach_the_sink() {
        let mut script = b"hi\r".to_vec();
        script.push(ctrl(b'q'));
        let editor = scripted_session(&[], None, &script);
        assert_eq!(editor.state.buffer.line(0), Some("hi"));
        assert_eq!(editor.state.buffer.line_count(), 2);
        assert_eq!(editor.state.cursor, Position::new(0, 1));
        assert!(editor.state.dirty);
        let frames = String::from_utf8_lossy(&editor.out);
        assert!(frames.contains("HELP: Ctrl-F = find"));
        assert!(frames.contains("\x1b[?25l"), "frames hide the cursor");
    }

    #[test]
    fn save_writes_named_buffer_and_clears_dirty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let mut script = b"ab".to_vec();
        script.push(ctrl(b's'));
        script.push(ctrl(b'q'));
        let editor = scripted_session(&[], Some(path.clone()), &script);
        assert_eq!(std::fs::read_to_string(&path).expect("saved file"), "ab\n");
        assert!(!editor.state.dirty);
    }

    #[test]
    fn save_prompt_names_an_unnamed_buffer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("named.txt");
        let mut script = b"x".to_vec();
        script.push(ctrl(b's'));
        script.extend_from_slice(path.to_str().expect("utf8 path").as_bytes());
        script.push(b'\r');
        script.push(ctrl(b'q'));
        let editor = scripted_session(&[], None, &script);
        assert_eq!(editor.state.file_name.as_deref(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).expect("saved file"), "x\n");
    }

    #[test]
    fn cancelled_save_prompt_aborts_without_touching_disk() {
        let mut script = b"x".to_vec();
        script.push(ctrl(b's'));
        script.push(0x1b); // Esc cancels the prompt
        script.push(ctrl(b'q'));
        let editor = scripted_session(&[], None, &script);
        assert!(editor.state.file_name.is_none());
        assert!(editor.state.dirty, "nothing was saved");
        let frames = String::from_utf8_lossy(&editor.out);
        assert!(frames.contains("Save aborted"));
    }

    #[test]
    fn find_jumps_to_match_via_prompt() {
        let mut script = Vec::new();
        script.push(ctrl(b'f'));
        script.extend_from_slice(b"baz\r");
        script.push(ctrl(b'q'));
        let editor = scripted_session(&["foo", "bar baz", "qux"], None, &script);
        assert_eq!(editor.state.cursor, Position::new(4, 1));
    }

    #[test]
    fn find_without_match_restores_view_and_reports() {
        let mut script = Vec::new();
        script.push(ctrl(b'f'));
        script.extend_from_slice(b"zzz\r");
        script.push(ctrl(b'q'));
        let editor = scripted_session(&["foo", "bar"], None, &script);
        assert_eq!(editor.state.cursor, Position::new(0, 0));
        assert_eq!(editor.viewport.row_offset, 0);
        let frames = String::from_utf8_lossy(&editor.out);
        assert!(frames.contains("Not found"));
    }

    #[test]
    fn prompt_backspace_edits_the_query() {
        let mut script = Vec::new();
        script.push(ctrl(b'f'));
        script.extend_from_slice(b"bax");
        script.push(BACKSPACE);
        script.extend_from_slice(b"r\r");
        script.push(ctrl(b'q'));
        let editor = scripted_session(&["foo", "bar"], None, &script);
        assert_eq!(editor.state.cursor, Position::new(0, 1), "matched 'bar'");
    }

    #[test]
    fn missing_file_starts_empty_named_buffer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.txt");
        let buffer = load_buffer(&path).expect("missing file is not an error");
        assert!(buffer.is_empty());
    }

    #[test]
    fn existing_file_loads_line_by_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("present.txt");
        std::fs::write(&path, "one\ntwo\n").expect("seed file");
        let buffer = load_buffer(&path).expect("load");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(1), Some("two"));
    }
}
