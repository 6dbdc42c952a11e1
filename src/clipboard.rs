use anyhow::{Context, Result};

/// Session-lifetime clipboard handle.
///
/// The underlying connection is opened on first use and kept for the rest
/// of the session: on X11 clipboard contents only live as long as the
/// owning connection, so a per-call handle would drop the token as soon as
/// the call returned. Contents still vanish at process exit, which is one
/// reason the token is always printed as well.
pub struct ClipboardWriter {
    clipboard: Option<arboard::Clipboard>,
}

impl ClipboardWriter {
    pub fn new() -> Self {
        Self { clipboard: None }
    }

    /// Copies `text` to the system clipboard.
    ///
    /// Failure here is never fatal; callers fall back to printing the value.
    pub fn copy(&mut self, text: &str) -> Result<()> {
        let mut clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().context("clipboard unavailable")?,
        };
        let result = clipboard
            .set_text(text.to_string())
            .context("failed to write to clipboard");
        self.clipboard = Some(clipboard);
        result
    }
}

impl Default for ClipboardWriter {
    fn default() -> Self {
        Self::new()
    }
}
