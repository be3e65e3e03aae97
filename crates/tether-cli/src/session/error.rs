//! Errors raised by a [`Session`](super::Session) round trip.

use std::io;
use std::time::Duration;

use thiserror::Error;

use tether_protocol::FrameError;

/// Failure of a single command round trip.
///
/// Recoverable variants describe a transport that can no longer be trusted;
/// by the time the caller sees them the session has already dropped the
/// socket, and the next call dials a fresh connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured endpoint did not resolve to a socket address.
    #[error("failed to resolve host address {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the host failed or exceeded the connect timeout.
    #[error("failed to connect to host at {endpoint}: {source}")]
    Connect {
        /// Endpoint as configured.
        endpoint: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// Writing the command failed.
    #[error("failed to send command: {0}")]
    Send(#[source] io::Error),
    /// No complete response arrived before the read deadline.
    #[error("no response from host within {}ms", after.as_millis())]
    Timeout {
        /// Deadline that elapsed.
        after: Duration,
    },
    /// Reading the response failed, or the host closed the connection first.
    #[error("failed to read response: {0}")]
    Io(#[source] io::Error),
    /// The response was truncated or exceeded the size ceiling.
    #[error("invalid response framing: {0}")]
    Framing(#[from] FrameError),
    /// The response parsed as JSON but is not a response envelope.
    #[error("malformed response envelope: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    /// The command could not be serialised.
    #[error("failed to serialise command: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The host answered with an error response.
    #[error("{message}")]
    Remote {
        /// Message reported by the host.
        message: String,
    },
    /// A query helper received a result of the wrong shape.
    #[error("unexpected result for {command}: {source}")]
    UnexpectedResult {
        /// Command whose result could not be decoded.
        command: &'static str,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Returns true when the error invalidated the connection.
    ///
    /// Remote errors, decoding failures and serialisation failures leave the
    /// connection usable; everything else means the socket was dropped and
    /// the next call reconnects.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Remote { .. } | Self::Serialise(_) | Self::UnexpectedResult { .. }
        )
    }

    /// Returns true when the host reported the failure.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub(crate) fn closed_early() -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "host closed the connection before responding",
        ))
    }
}
