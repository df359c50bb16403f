use crate::{Error, Result};

/// Destination for "copy to clipboard"
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Clipboard` if the system clipboard is unavailable.
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard.
///
/// The handle is opened on first use and kept for the life of the process, since
/// on X11 and Wayland the owning process serves the contents.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?,
        };
        self.inner
            .insert(clipboard)
            .set_text(text)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}
