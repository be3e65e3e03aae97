//! Whole-buffer framing for length-prefix-free JSON messages.
//!
//! Each endpoint sends exactly one message and waits for the peer to consume
//! it before sending the next, so a complete message always occupies the whole
//! buffer. Completion is detected by parsing everything received so far; a
//! failed parse means "keep reading". Bytes belonging to a pipelined second
//! message are not supported and simply keep the parse failing.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while accumulating or closing a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The peer closed the stream with an unparsed partial message buffered.
    #[error("connection closed mid-message with {pending} unparsed bytes")]
    Truncated {
        /// Number of bytes discarded with the connection.
        pending: usize,
    },
    /// The accumulated message would exceed the configured ceiling.
    #[error("message of {size} bytes exceeds the {max_size} byte limit")]
    TooLarge {
        /// Size the buffer would have reached.
        size: usize,
        /// Configured ceiling.
        max_size: usize,
    },
}

/// Growable buffer holding the bytes of one not-yet-complete message.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    max_size: usize,
}

impl FrameBuffer {
    /// Creates an empty buffer that refuses to grow beyond `max_size` bytes.
    #[must_use]
    pub const fn new(max_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_size,
        }
    }

    /// Appends received bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] and leaves the buffer unchanged when
    /// the bytes would push it past the ceiling.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let size = self.pending.len().saturating_add(bytes.len());
        if size > self.max_size {
            return Err(FrameError::TooLarge {
                size,
                max_size: self.max_size,
            });
        }
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    /// Attempts to parse the whole buffer as one JSON document.
    ///
    /// On success the buffer is cleared and the document returned. Any parse
    /// failure leaves the buffer untouched and returns `None`.
    pub fn try_extract(&mut self) -> Option<Value> {
        if self.pending.is_empty() {
            return None;
        }
        let value = serde_json::from_slice::<Value>(&self.pending).ok()?;
        self.pending.clear();
        Some(value)
    }

    /// Resolves the buffer when the peer closes the stream.
    ///
    /// The buffer is cleared in every case.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Truncated`] when unparsed bytes were pending,
    /// which distinguishes a cut-off message from a clean close.
    pub fn finish(&mut self) -> Result<(), FrameError> {
        let pending = self.pending.len();
        self.pending.clear();
        if pending == 0 {
            Ok(())
        } else {
            Err(FrameError::Truncated { pending })
        }
    }

    /// Discards any pending bytes.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true when no bytes are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
