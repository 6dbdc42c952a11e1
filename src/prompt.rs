/// Single-choice selection and yes/no prompts.
///
/// Same raw-mode loop shape as the fuzzy filter: a pure cursor state that
/// key events are fed into, wrapped by a read/redraw loop. Escape and
/// Ctrl-C cancel the whole session via [`Cancelled`].
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::Cancelled;
use crate::term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Moved,
    Ignored,
    Confirmed,
    Cancelled,
}

/// Cursor over a fixed option list, wrapping at both ends.
pub struct SelectState {
    len: usize,
    index: usize,
}

impl SelectState {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn apply_key(&mut self, key: &KeyEvent) -> SelectOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return SelectOutcome::Cancelled;
        }

        match key.code {
            KeyCode::Up => {
                self.index = if self.index == 0 {
                    self.len - 1
                } else {
                    self.index - 1
                };
                SelectOutcome::Moved
            }
            KeyCode::Down => {
                self.index = (self.index + 1) % self.len;
                SelectOutcome::Moved
            }
            KeyCode::Enter => SelectOutcome::Confirmed,
            KeyCode::Esc => SelectOutcome::Cancelled,
            _ => SelectOutcome::Ignored,
        }
    }
}

/// Prompts for exactly one of `options`, returning its index.
pub fn select<S: AsRef<str>>(title: &str, options: &[S]) -> Result<usize> {
    if options.is_empty() {
        bail!("selection prompt invoked with no options");
    }

    let mut state = SelectState::new(options.len());
    let _raw = term::RawModeGuard::enable().context("failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();

    redraw(&mut stdout, title, options, state.index())?;

    loop {
        let event = event::read().context("failed to read terminal event")?;
        let Event::Key(key) = event else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.apply_key(&key) {
            SelectOutcome::Moved => redraw(&mut stdout, title, options, state.index())?,
            SelectOutcome::Ignored => {}
            SelectOutcome::Confirmed => return Ok(state.index()),
            SelectOutcome::Cancelled => return Err(Cancelled.into()),
        }
    }
}

/// Binary yes/no prompt; "yes" is the first choice.
pub fn confirm(title: &str) -> Result<bool> {
    Ok(select(title, &["yes", "no"])? == 0)
}

fn redraw<S: AsRef<str>>(
    out: &mut impl Write,
    title: &str,
    options: &[S],
    selected: usize,
) -> Result<()> {
    term::clear_screen(out)?;
    term::write_line(out, title)?;
    for (i, option) in options.iter().enumerate() {
        let marker = if i == selected { ">" } else { " " };
        term::write_line(out, &format!("{} {}", marker, option.as_ref()))?;
    }
    out.flush()?;
    Ok(())
}
