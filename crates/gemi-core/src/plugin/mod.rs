//! Launcher plugin protocol over stdio.

mod stdio;
mod transport;

pub use stdio::{Reload, handle_input, serve};
pub use transport::{CodecError, JsonLineCodec, MAX_LINE_LENGTH};
