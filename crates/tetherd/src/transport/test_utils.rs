//! Test helpers for the transport module.

use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use tether_config::Config;
use tether_protocol::{FrameBuffer, Response};

use super::CommandServer;
use crate::dispatch::{
    ContextRequirement, Dispatcher, HandlerError, HandlerResult, HandlerTable, Host, NoParams,
};

const HARNESS_TICK: Duration = Duration::from_millis(5);

/// Host that records the commands it ran.
#[derive(Debug, Default)]
pub(crate) struct TestHost {
    pub(crate) seen: Vec<String>,
    pub(crate) active: bool,
}

impl Host for TestHost {
    fn with_active_context(
        &mut self,
        command: &str,
        operation: &mut dyn FnMut(&mut Self) -> HandlerResult,
    ) -> HandlerResult {
        self.seen.push(command.to_owned());
        self.active = true;
        let result = operation(self);
        self.active = false;
        result
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoParams {
    value: Value,
}

pub(crate) fn test_dispatcher() -> Dispatcher<TestHost> {
    let table = HandlerTable::builder()
        .register(
            "echo",
            ContextRequirement::Any,
            |_: &mut TestHost, params: EchoParams| Ok::<_, HandlerError>(params.value),
        )
        .register(
            "in_context",
            ContextRequirement::Active,
            |host: &mut TestHost, _: NoParams| Ok::<_, HandlerError>(json!({"active": host.active})),
        )
        .register(
            "fail",
            ContextRequirement::Any,
            |_: &mut TestHost, _: NoParams| Err::<Value, _>(HandlerError::failed("deliberate failure")),
        )
        .build();
    Dispatcher::new(table)
}

pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        ..Config::default()
    }
}

/// Reads one complete response from a blocking client stream.
pub(crate) fn read_response(stream: &mut TcpStream) -> Response {
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set read timeout");
    let mut buffer = FrameBuffer::new(1 << 20);
    let mut chunk = [0_u8; 1024];
    loop {
        let read = stream.read(&mut chunk).expect("read response");
        assert!(read > 0, "server closed the connection before replying");
        buffer.append(&chunk[..read]).expect("buffer response");
        if let Some(value) = buffer.try_extract() {
            return Response::from_value(value).expect("response envelope");
        }
    }
}

/// Command server driven by a background thread, for end-to-end tests.
pub(crate) struct ServerHarness {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ServerHarness {
    /// Starts a server whose host and dispatcher are built on the server
    /// thread, so neither needs to be `Send`.
    pub(crate) fn spawn_with<H, F>(config: Config, factory: F) -> Self
    where
        H: Host + 'static,
        F: FnOnce() -> (H, Dispatcher<H>) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            let (mut host, dispatcher) = factory();
            let mut server = CommandServer::new(&config);
            let addr = server.start().expect("start command server");
            sender.send(addr).expect("report address");
            while !flag.load(Ordering::SeqCst) {
                server.tick(&dispatcher, &mut host);
                thread::sleep(HARNESS_TICK);
            }
            server.stop();
        });
        let addr = receiver.recv().expect("server thread reports address");
        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub(crate) const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ServerHarness {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
