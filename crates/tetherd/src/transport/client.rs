//! State for the single connected client.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

use tether_protocol::{FrameBuffer, FrameError, Response};

/// Largest amount read from the client in one tick.
pub(crate) const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Why the server dropped its client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the stream between messages.
    PeerClosed,
    /// The peer closed the stream with a partial message buffered.
    Truncated {
        /// Bytes discarded with the connection.
        pending: usize,
    },
    /// The peer sent more bytes than the frame ceiling allows.
    TooLarge {
        /// Size the buffer would have reached.
        size: usize,
        /// Configured ceiling.
        max_size: usize,
    },
    /// Reading from the socket failed.
    ReadFailed(io::ErrorKind),
    /// Writing the reply failed.
    WriteFailed(io::ErrorKind),
}

impl CloseReason {
    /// Returns true for closes caused by malformed framing.
    #[must_use]
    pub const fn is_framing_error(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::TooLarge { .. })
    }
}

impl From<FrameError> for CloseReason {
    fn from(error: FrameError) -> Self {
        match error {
            FrameError::Truncated { pending } => Self::Truncated { pending },
            FrameError::TooLarge { size, max_size } => Self::TooLarge { size, max_size },
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => formatter.write_str("peer closed the connection"),
            Self::Truncated { pending } => write!(
                formatter,
                "peer closed mid-message with {pending} unparsed bytes"
            ),
            Self::TooLarge { size, max_size } => write!(
                formatter,
                "message of {size} bytes exceeds the {max_size} byte limit"
            ),
            Self::ReadFailed(kind) => write!(formatter, "read failed: {kind}"),
            Self::WriteFailed(kind) => write!(formatter, "reply write failed: {kind}"),
        }
    }
}

/// Result of one non-blocking read attempt.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// Nothing was available.
    Idle,
    /// Bytes arrived but do not yet form a complete message.
    Partial,
    /// A complete JSON document was extracted.
    Message(Value),
    /// The connection must be torn down.
    Closed(CloseReason),
}

#[derive(Debug)]
pub(crate) struct ClientConnection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: FrameBuffer,
}

impl ClientConnection {
    /// Prepares an accepted stream for polling.
    pub(crate) fn accept(
        stream: TcpStream,
        peer: SocketAddr,
        max_message_bytes: usize,
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            peer,
            buffer: FrameBuffer::new(max_message_bytes),
        })
    }

    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Reads at most one chunk without blocking.
    pub(crate) fn poll_read(&mut self) -> ReadOutcome {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        match self.stream.read(&mut chunk) {
            Ok(0) => match self.buffer.finish() {
                Ok(()) => ReadOutcome::Closed(CloseReason::PeerClosed),
                Err(error) => ReadOutcome::Closed(error.into()),
            },
            Ok(read) => {
                if let Err(error) = self.buffer.append(&chunk[..read]) {
                    self.buffer.clear();
                    return ReadOutcome::Closed(error.into());
                }
                self.buffer
                    .try_extract()
                    .map_or(ReadOutcome::Partial, ReadOutcome::Message)
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                ReadOutcome::Idle
            }
            Err(error) => {
                self.buffer.clear();
                ReadOutcome::Closed(CloseReason::ReadFailed(error.kind()))
            }
        }
    }

    /// Writes a reply in blocking mode bounded by `write_timeout`.
    ///
    /// The stream is returned to non-blocking mode whether or not the write
    /// succeeded.
    pub(crate) fn send(&mut self, response: &Response, write_timeout: Duration) -> io::Result<()> {
        let bytes = response.to_bytes().map_err(io::Error::from)?;
        self.stream.set_nonblocking(false)?;
        let timeout = (!write_timeout.is_zero()).then_some(write_timeout);
        let written = self
            .stream
            .set_write_timeout(timeout)
            .and_then(|()| self.stream.write_all(&bytes))
            .and_then(|()| self.stream.flush());
        let restored = self.stream.set_nonblocking(true);
        written?;
        restored
    }
}
