//! Agent-side connection manager.
//!
//! A [`Session`] owns at most one TCP connection to the host and performs one
//! command round trip at a time. It connects lazily, reuses the connection
//! across calls, and drops it on any transport or framing failure so the next
//! call starts from a fresh socket. A request is never resent on the socket
//! that failed.

mod error;
mod probe;
mod queries;

#[cfg(test)]
mod tests;

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use tether_config::{Config, TcpEndpoint};
use tether_protocol::{Command, CommandParams, FrameBuffer, Response};

pub use error::SessionError;
pub use queries::{CommandList, MeshStats, ObjectInfo, ObjectSummary, Pong, SceneInfo};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Lifecycle of the session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket has been opened yet, or it was closed deliberately.
    #[default]
    Disconnected,
    /// A socket is open and believed usable.
    Connected,
    /// The previous socket failed and was dropped.
    Faulted,
}

/// Transport settings used by a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Endpoint the session dials.
    pub endpoint: TcpEndpoint,
    /// Budget for establishing a connection.
    pub connect_timeout: Duration,
    /// Overall deadline for receiving one complete response.
    pub read_timeout: Duration,
    /// Largest response the session will buffer.
    pub max_message_bytes: usize,
    /// Probe a cached connection before sending on it.
    pub probe_before_reuse: bool,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint(),
            connect_timeout: config.connect_timeout(),
            read_timeout: config.effective_read_timeout(),
            max_message_bytes: config.max_message_bytes(),
            probe_before_reuse: config.probe_before_reuse(),
        }
    }
}

/// Connection manager for sending commands to the host.
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    stream: Option<TcpStream>,
    buffer: FrameBuffer,
    state: ConnectionState,
}

impl Session {
    /// Creates a disconnected session; nothing is dialled until the first command.
    #[must_use]
    pub const fn new(settings: SessionSettings) -> Self {
        let buffer = FrameBuffer::new(settings.max_message_bytes);
        Self {
            settings,
            stream: None,
            buffer,
            state: ConnectionState::Disconnected,
        }
    }

    /// Creates a session from the shared configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(SessionSettings::from(config))
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Settings the session was created with.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Sends one command and waits for its response.
    ///
    /// Returns the `result` payload of a success response.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Remote`] when the host answers with an error
    /// response; the connection is kept. Transport, timeout and framing
    /// failures drop the connection before returning; see
    /// [`SessionError::is_recoverable`].
    pub fn send_command(
        &mut self,
        kind: &str,
        params: CommandParams,
    ) -> Result<Value, SessionError> {
        let payload = Command::new(kind, params)
            .to_bytes()
            .map_err(SessionError::Serialise)?;
        if self.settings.probe_before_reuse {
            self.probe_cached_connection();
        }
        self.ensure_connected()?;

        let response = match self.exchange(&payload) {
            Ok(response) => response,
            Err(error) => {
                self.invalidate(&error);
                return Err(error);
            }
        };
        debug!(
            target: SESSION_TARGET,
            command = kind,
            success = response.is_success(),
            "response received"
        );
        response
            .into_result()
            .map_err(|message| SessionError::Remote { message })
    }

    /// Closes the connection, if any, and returns to `Disconnected`.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!(target: SESSION_TARGET, "connection closed");
        }
        self.buffer.clear();
        self.state = ConnectionState::Disconnected;
    }

    fn ensure_connected(&mut self) -> Result<(), SessionError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let endpoint = &self.settings.endpoint;
        let address = endpoint.resolve().map_err(|source| SessionError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let stream = connect(address, self.settings.connect_timeout).map_err(|source| {
            SessionError::Connect {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
        if let Err(error) = stream.set_nodelay(true) {
            debug!(target: SESSION_TARGET, %error, "failed to disable Nagle");
        }
        debug!(target: SESSION_TARGET, %address, "connected to host");
        self.stream = Some(stream);
        self.buffer.clear();
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn exchange(&mut self, payload: &[u8]) -> Result<Response, SessionError> {
        let deadline_budget = self.settings.read_timeout;
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::closed_early());
        };
        stream
            .write_all(payload)
            .and_then(|()| stream.flush())
            .map_err(SessionError::Send)?;
        let value = read_message(stream, &mut self.buffer, deadline_budget)?;
        Response::from_value(value).map_err(SessionError::MalformedResponse)
    }

    fn probe_cached_connection(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        if let Err(reason) = probe::check(stream) {
            debug!(target: SESSION_TARGET, %reason, "cached connection failed liveness probe");
            self.stream = None;
            self.buffer.clear();
            self.state = ConnectionState::Faulted;
        }
    }

    fn invalidate(&mut self, error: &SessionError) {
        if !error.is_recoverable() {
            return;
        }
        warn!(target: SESSION_TARGET, %error, "dropping connection to host");
        self.stream = None;
        self.buffer.clear();
        self.state = ConnectionState::Faulted;
    }
}

fn connect(address: std::net::SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    if timeout.is_zero() {
        TcpStream::connect(address)
    } else {
        TcpStream::connect_timeout(&address, timeout)
    }
}

fn read_message(
    stream: &mut TcpStream,
    buffer: &mut FrameBuffer,
    budget: Duration,
) -> Result<Value, SessionError> {
    buffer.clear();
    let deadline = Instant::now() + budget;
    let mut chunk = [0_u8; READ_CHUNK_BYTES];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SessionError::Timeout { after: budget });
        }
        stream
            .set_read_timeout(Some(remaining))
            .map_err(SessionError::Io)?;
        match stream.read(&mut chunk) {
            Ok(0) => {
                buffer.finish()?;
                return Err(SessionError::closed_early());
            }
            Ok(read) => {
                buffer.append(chunk.get(..read).unwrap_or_default())?;
                if let Some(value) = buffer.try_extract() {
                    return Ok(value);
                }
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(error) => return Err(SessionError::Io(error)),
        }
    }
}
