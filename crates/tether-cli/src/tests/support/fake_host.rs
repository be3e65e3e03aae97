//! Scripted stand-in for the host's command server.
//!
//! Serves one connection at a time, reads whole-buffer framed commands and
//! answers each from a script. Commands beyond the script receive a success
//! response echoing the command type.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

use tether_protocol::{Command, FrameBuffer, Response};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const MAX_COMMAND_BYTES: usize = 1024 * 1024;

/// What the fake host does with the next command it receives.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Writes the response.
    Respond(Response),
    /// Writes the response and closes the connection.
    RespondThenClose(Response),
    /// Writes arbitrary bytes.
    Raw(Vec<u8>),
    /// Writes arbitrary bytes and closes the connection.
    RawThenClose(Vec<u8>),
    /// Never answers; the connection stays open until the client leaves.
    Withhold,
}

impl Reply {
    pub(crate) fn success(result: Value) -> Self {
        Self::Respond(Response::success(result))
    }

    pub(crate) fn error(message: &str) -> Self {
        Self::Respond(Response::error(message))
    }
}

#[derive(Debug, Default)]
struct Record {
    connections: AtomicUsize,
    commands: Mutex<Vec<Command>>,
}

/// Handle to a running fake host; stops the server thread on drop.
pub(crate) struct FakeHost {
    port: u16,
    record: Arc<Record>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeHost {
    /// Spawns a fake host on an ephemeral loopback port.
    pub(crate) fn spawn(script: Vec<Reply>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake host")?;
        listener
            .set_nonblocking(true)
            .context("fake host nonblocking")?;
        let addr = listener.local_addr().context("fake host local addr")?;
        let record = Arc::new(Record::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let server = Server {
            listener,
            script: script.into(),
            record: Arc::clone(&record),
            shutdown: Arc::clone(&shutdown),
        };
        let handle = thread::spawn(move || server.run());
        Ok(Self {
            port: addr.port(),
            record,
            shutdown,
            handle: Some(handle),
        })
    }

    pub(crate) const fn port(&self) -> u16 {
        self.port
    }

    /// Number of connections accepted so far.
    pub(crate) fn connections(&self) -> usize {
        self.record.connections.load(Ordering::SeqCst)
    }

    /// Commands received so far, in arrival order.
    pub(crate) fn commands(&self) -> Result<Vec<Command>> {
        self.record
            .commands
            .lock()
            .map(|commands| commands.clone())
            .map_err(|error| anyhow!("lock received commands: {error}"))
    }
}

impl Drop for FakeHost {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Server {
    listener: TcpListener,
    script: VecDeque<Reply>,
    record: Arc<Record>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    fn run(mut self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    self.record.connections.fetch_add(1, Ordering::SeqCst);
                    if self.serve(stream).is_err() {
                        continue;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(_) => return,
            }
        }
    }

    fn serve(&mut self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        let mut buffer = FrameBuffer::new(MAX_COMMAND_BYTES);
        let mut chunk = [0_u8; 4096];
        while !self.shutdown.load(Ordering::SeqCst) {
            let read = match stream.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(read) => read,
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    continue;
                }
                Err(error) => return Err(error),
            };
            buffer
                .append(&chunk[..read])
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
            let Some(value) = buffer.try_extract() else {
                continue;
            };
            let command = Command::from_value(value)
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
            let reply = self.next_reply(&command);
            if let Ok(mut commands) = self.record.commands.lock() {
                commands.push(command);
            }
            if !Self::answer(&mut stream, reply)? {
                return Ok(());
            }
        }
        Ok(())
    }

    fn next_reply(&mut self, command: &Command) -> Reply {
        self.script
            .pop_front()
            .unwrap_or_else(|| Reply::success(json!({ "received": command.kind })))
    }

    /// Writes the reply and reports whether the connection stays open.
    fn answer(stream: &mut TcpStream, reply: Reply) -> io::Result<bool> {
        let (bytes, keep_open) = match reply {
            Reply::Respond(response) => (response.to_bytes()?, true),
            Reply::RespondThenClose(response) => (response.to_bytes()?, false),
            Reply::Raw(bytes) => (bytes, true),
            Reply::RawThenClose(bytes) => (bytes, false),
            Reply::Withhold => return Ok(true),
        };
        stream.write_all(&bytes)?;
        stream.flush()?;
        Ok(keep_open)
    }
}
