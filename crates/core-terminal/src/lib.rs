//! Terminal backend abstraction and crossterm implementation.
//!
//! The editor draws on the primary screen and promises to hand the terminal
//! back in cooked mode with the display erased on every exit path: normal
//! quit, fatal error, and panic. The RAII guard makes the last case hold
//! without any cooperation from the unwinding code.

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{self, Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring raw mode is released even if the caller early-returns
/// or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter raw mode and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode().context("failed to enable raw mode")?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            disable_raw_mode().context("failed to restore terminal mode")?;
            self.entered = false;
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}

/// Current terminal extent as `(columns, rows)`.
pub fn terminal_size() -> Result<(u16, u16)> {
    terminal::size().context("failed to query terminal size")
}

/// Erase the display and home the cursor; shared by the quit and fatal exit
/// paths.
pub fn clear_and_home() -> Result<()> {
    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))
        .context("failed to clear terminal")?;
    Ok(())
}
