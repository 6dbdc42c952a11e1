/// Shared terminal plumbing for the interactive prompts.
///
/// Raw mode is only ever held for the duration of one prompt; the guard
/// restores cooked mode on drop so a cancellation unwinding through `?`
/// leaves the terminal usable.
use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};

pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Clears the screen and homes the cursor. Used before every redraw.
pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Writes one display line. Raw mode needs an explicit carriage return.
pub fn write_line(out: &mut impl Write, line: &str) -> io::Result<()> {
    write!(out, "{}\r\n", line)
}
