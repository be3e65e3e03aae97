//! Liveness probe for a cached connection.

use std::fmt;
use std::io::{self, Write};
use std::net::TcpStream;

/// Why a cached connection was judged unusable.
#[derive(Debug)]
pub(super) enum ProbeFailure {
    /// The socket rejected a write or a mode change.
    Io(io::Error),
    /// The peer has closed its end.
    PeerClosed,
    /// Bytes arrived that no request asked for.
    UnexpectedData,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(formatter, "socket error: {error}"),
            Self::PeerClosed => formatter.write_str("peer closed the connection"),
            Self::UnexpectedData => formatter.write_str("unsolicited bytes pending"),
        }
    }
}

/// Checks that `stream` is still open and idle.
///
/// Writes zero bytes to surface a pending socket error, then peeks without
/// blocking: a would-block result is the only healthy outcome. The stream is
/// returned to blocking mode before a healthy result is reported.
pub(super) fn check(stream: &mut TcpStream) -> Result<(), ProbeFailure> {
    stream.write(&[]).map_err(ProbeFailure::Io)?;
    if let Some(error) = stream.take_error().map_err(ProbeFailure::Io)? {
        return Err(ProbeFailure::Io(error));
    }
    stream.set_nonblocking(true).map_err(ProbeFailure::Io)?;
    let mut byte = [0_u8; 1];
    let outcome = match stream.peek(&mut byte) {
        Ok(0) => Err(ProbeFailure::PeerClosed),
        Ok(_) => Err(ProbeFailure::UnexpectedData),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(()),
        Err(error) => Err(ProbeFailure::Io(error)),
    };
    stream.set_nonblocking(false).map_err(ProbeFailure::Io)?;
    outcome
}
