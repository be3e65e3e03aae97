//! Error types for command server lifecycle operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while starting the command server.
///
/// Per-connection failures never appear here; they close the client and are
/// reported through [`super::CloseReason`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("failed to create listening socket: {source}")]
    Socket {
        #[source]
        source: io::Error,
    },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
}
