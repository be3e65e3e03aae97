//! Cooperative, tick-driven command server.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use serde_json::Value;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use tether_config::{Config, TcpEndpoint};

use super::client::{ClientConnection, CloseReason, ReadOutcome};
use super::{ServerError, TRANSPORT_TARGET};
use crate::dispatch::{Dispatcher, Host};

/// Connections the kernel may queue while a client is being served.
const LISTEN_BACKLOG: i32 = 1;

/// Summary of the work performed by one [`CommandServer::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Peer accepted during this tick.
    pub accepted: Option<SocketAddr>,
    /// Command type dispatched during this tick, when the envelope named one.
    pub dispatched: Option<String>,
    /// Whether a reply was written.
    pub responded: bool,
    /// Why the client was dropped during this tick.
    pub closed: Option<CloseReason>,
}

impl TickReport {
    /// Returns true when the tick neither accepted, replied nor closed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.accepted.is_none() && !self.responded && self.closed.is_none()
    }
}

#[derive(Debug)]
enum ServerState {
    Stopped,
    Listening {
        listener: TcpListener,
        local_addr: SocketAddr,
        client: Option<ClientConnection>,
    },
}

/// Single-client TCP command server polled from the host's thread.
///
/// The server never blocks while reading or accepting. Each [`tick`] moves
/// the connection forward by at most one step and, when a full command has
/// arrived, dispatches it and writes the reply before returning.
///
/// [`tick`]: CommandServer::tick
#[derive(Debug)]
pub struct CommandServer {
    endpoint: TcpEndpoint,
    write_timeout: Duration,
    max_message_bytes: usize,
    state: ServerState,
    last_accept_error: Option<io::ErrorKind>,
}

impl CommandServer {
    /// Creates a stopped server using the endpoint and limits in `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint(),
            write_timeout: config.write_timeout(),
            max_message_bytes: config.max_message_bytes(),
            state: ServerState::Stopped,
            last_accept_error: None,
        }
    }

    /// Endpoint the server binds to.
    #[must_use]
    pub const fn endpoint(&self) -> &TcpEndpoint {
        &self.endpoint
    }

    /// Returns true while the listening socket is open.
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        matches!(self.state, ServerState::Listening { .. })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            ServerState::Listening { local_addr, .. } => Some(*local_addr),
            ServerState::Stopped => None,
        }
    }

    /// Returns true while a client is being served.
    #[must_use]
    pub const fn has_client(&self) -> bool {
        matches!(
            self.state,
            ServerState::Listening {
                client: Some(_),
                ..
            }
        )
    }

    /// Opens the listening socket. Calling this while listening is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] when the endpoint cannot be resolved or the
    /// socket cannot be bound and placed in non-blocking listening mode.
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(local_addr) = self.local_addr() {
            return Ok(local_addr);
        }
        let addr = self
            .endpoint
            .resolve()
            .map_err(|source| ServerError::Resolve {
                host: self.endpoint.host.clone(),
                port: self.endpoint.port,
                source,
            })?;
        let listener = bind_listener(addr)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Socket { source })?;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            local_addr = %local_addr,
            "command server listening"
        );
        self.state = ServerState::Listening {
            listener,
            local_addr,
            client: None,
        };
        self.last_accept_error = None;
        Ok(local_addr)
    }

    /// Closes the client and the listening socket. No-op when stopped.
    pub fn stop(&mut self) {
        let previous = std::mem::replace(&mut self.state, ServerState::Stopped);
        if let ServerState::Listening {
            local_addr, client, ..
        } = previous
        {
            if let Some(client) = client {
                debug!(
                    target: TRANSPORT_TARGET,
                    peer = %client.peer(),
                    pending = client.pending_bytes(),
                    "dropping client on shutdown"
                );
            }
            info!(target: TRANSPORT_TARGET, local_addr = %local_addr, "command server stopped");
        }
    }

    /// Advances the server by one cooperative step.
    ///
    /// Performs at most one accept (only while no client is connected), one
    /// read of up to 8 KiB and, if that read completed a message, one
    /// dispatch followed by a blocking reply write. Returns immediately when
    /// stopped.
    pub fn tick<H: Host>(&mut self, dispatcher: &Dispatcher<H>, host: &mut H) -> TickReport {
        let mut report = TickReport::default();
        let ServerState::Listening {
            listener, client, ..
        } = &mut self.state
        else {
            return report;
        };

        if client.is_none() {
            match accept(listener, self.max_message_bytes) {
                Ok(Some(connection)) => {
                    self.last_accept_error = None;
                    info!(target: TRANSPORT_TARGET, peer = %connection.peer(), "client connected");
                    report.accepted = Some(connection.peer());
                    *client = Some(connection);
                }
                Ok(None) => {}
                Err(error) => {
                    let kind = error.kind();
                    if self.last_accept_error != Some(kind) {
                        warn!(target: TRANSPORT_TARGET, error = %error, "socket accept error");
                    }
                    self.last_accept_error = Some(kind);
                }
            }
        }

        let Some(connection) = client.as_mut() else {
            return report;
        };

        let value = match connection.poll_read() {
            ReadOutcome::Idle | ReadOutcome::Partial => return report,
            ReadOutcome::Closed(reason) => {
                close_client(client, reason, &mut report);
                return report;
            }
            ReadOutcome::Message(value) => value,
        };

        report.dispatched = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let response = dispatcher.dispatch_value(host, value);
        match connection.send(&response, self.write_timeout) {
            Ok(()) => report.responded = true,
            Err(error) => close_client(client, CloseReason::WriteFailed(error.kind()), &mut report),
        }
        report
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn close_client(client: &mut Option<ClientConnection>, reason: CloseReason, report: &mut TickReport) {
    if let Some(connection) = client.take() {
        if reason.is_framing_error() {
            warn!(
                target: TRANSPORT_TARGET,
                peer = %connection.peer(),
                reason = %reason,
                "closing client after framing error"
            );
        } else {
            info!(
                target: TRANSPORT_TARGET,
                peer = %connection.peer(),
                reason = %reason,
                "client disconnected"
            );
        }
    }
    report.closed = Some(reason);
}

fn accept(listener: &TcpListener, max_message_bytes: usize) -> io::Result<Option<ClientConnection>> {
    match listener.accept() {
        Ok((stream, peer)) => ClientConnection::accept(stream, peer, max_message_bytes).map(Some),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|source| ServerError::Socket { source })?;
    socket
        .set_reuse_address(true)
        .map_err(|source| ServerError::Socket { source })?;
    socket
        .bind(&addr.into())
        .map_err(|source| ServerError::Bind { addr, source })?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| ServerError::Listen { addr, source })?;
    socket
        .set_nonblocking(true)
        .map_err(|source| ServerError::NonBlocking { source })?;
    Ok(socket.into())
}
