//! Newline-delimited JSON codec for the launcher's stdio protocol.
//!
//! Frame format: one JSON document per line, terminated by `\n`. Inbound lines are
//! handed out as text so a malformed request can be answered instead of ending
//! the stream.

use bytes::{BufMut, BytesMut};
use gemi_types::PluginResponse;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Maximum line length (16 MB)
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Codec for newline-delimited JSON
#[derive(Debug, Default)]
pub struct JsonLineCodec {
    /// Bytes already scanned for a newline
    scanned: usize,
}

impl JsonLineCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn take_line(&mut self, src: &mut BytesMut, len: usize, consumed: usize) -> Option<String> {
        let frame = src.split_to(consumed);
        self.scanned = 0;
        let line = String::from_utf8_lossy(&frame[..len]);
        let line = line.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

impl Decoder for JsonLineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(CodecError::LineTooLong(src.len()));
                }
                self.scanned = src.len();
                return Ok(None);
            };

            let newline = self.scanned + offset;
            if newline > MAX_LINE_LENGTH {
                return Err(CodecError::LineTooLong(newline));
            }

            // Blank lines are skipped
            if let Some(line) = self.take_line(src, newline, newline + 1) {
                return Ok(Some(line));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Final line without a trailing newline
        let len = src.len();
        Ok(self.take_line(src, len, len))
    }
}

impl Encoder<PluginResponse> for JsonLineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: PluginResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;
        dst.reserve(json.len() + 1);
        dst.put_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Errors that can occur during codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line too long: {0} bytes (max: {MAX_LINE_LENGTH})")]
    LineTooLong(usize),
}
