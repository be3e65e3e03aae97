//! Behavioural tests for the command server serving the scene host.

use std::cell::RefCell;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use tether_protocol::{Command, CommandParams, Response};

use super::support::ephemeral_config;
use crate::dispatch::Dispatcher;
use crate::scene;
use crate::transport::{ServerHarness, read_response};

const PENDING_PROBE: Duration = Duration::from_millis(150);

#[derive(Default)]
struct ServerWorld {
    harness: Option<ServerHarness>,
    agent: Option<TcpStream>,
    second: Option<TcpStream>,
    response: Option<Response>,
}

impl ServerWorld {
    fn start(&mut self) {
        let config = ephemeral_config();
        let install_config = config.clone();
        self.harness = Some(ServerHarness::spawn_with(config, move || {
            let (host, table) = scene::install(&install_config);
            (host, Dispatcher::new(table))
        }));
    }

    fn connect(&self) -> TcpStream {
        let addr = self.harness.as_ref().expect("host running").addr();
        TcpStream::connect(addr).expect("connect agent")
    }

    fn send(&mut self, command: &Command) {
        if self.agent.is_none() {
            self.agent = Some(self.connect());
        }
        let agent = self.agent.as_mut().expect("agent connected");
        agent
            .write_all(&command.to_bytes().expect("serialise command"))
            .expect("send command");
        self.response = Some(read_response(agent));
    }

    fn response(&self) -> &Response {
        self.response.as_ref().expect("a response was received")
    }
}

#[fixture]
fn world() -> RefCell<ServerWorld> {
    RefCell::new(ServerWorld::default())
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches('"')
}

#[given("a running scene host")]
fn given_running_host(world: &RefCell<ServerWorld>) {
    world.borrow_mut().start();
}

#[given("a connected first agent")]
fn given_first_agent(world: &RefCell<ServerWorld>) {
    world
        .borrow_mut()
        .send(&Command::bare("ping"));
}

#[when(r#"the agent sends a "{kind}" command"#)]
fn when_agent_sends(world: &RefCell<ServerWorld>, kind: String) {
    world
        .borrow_mut()
        .send(&Command::bare(strip_quotes(&kind)));
}

#[when(r#"the agent asks for object "{name}""#)]
fn when_agent_asks_for_object(world: &RefCell<ServerWorld>, name: String) {
    let mut params = CommandParams::new();
    params.insert("name".to_owned(), json!(strip_quotes(&name)));
    world
        .borrow_mut()
        .send(&Command::new("get_object_info", params));
}

#[when(r#"a second agent sends a "{kind}" command"#)]
fn when_second_agent_sends(world: &RefCell<ServerWorld>, kind: String) {
    let mut world = world.borrow_mut();
    let mut second = world.connect();
    second
        .write_all(
            &Command::bare(strip_quotes(&kind))
                .to_bytes()
                .expect("serialise command"),
        )
        .expect("queue command");
    world.second = Some(second);
}

#[when("the first agent disconnects")]
fn when_first_agent_disconnects(world: &RefCell<ServerWorld>) {
    world.borrow_mut().agent = None;
}

#[then("the response is a success")]
fn then_success(world: &RefCell<ServerWorld>) {
    let world = world.borrow();
    assert!(world.response().is_success(), "{:?}", world.response());
}

#[then("the result reports pong")]
fn then_pong(world: &RefCell<ServerWorld>) {
    assert_eq!(
        world.borrow().response(),
        &Response::success(json!({"pong": true}))
    );
}

#[then(r#"the response is an error mentioning "{text}""#)]
fn then_error_mentions(world: &RefCell<ServerWorld>, text: String) {
    let world = world.borrow();
    let Response::Error { message } = world.response() else {
        panic!("expected error response, got {:?}", world.response());
    };
    assert!(message.contains(strip_quotes(&text)), "{message}");
}

#[then("the second agent receives no reply yet")]
fn then_second_waits(world: &RefCell<ServerWorld>) {
    let mut world = world.borrow_mut();
    let second = world.second.as_mut().expect("second agent connected");
    second
        .set_read_timeout(Some(PENDING_PROBE))
        .expect("set read timeout");
    let mut probe = [0_u8; 16];
    let error = second
        .read(&mut probe)
        .expect_err("second agent must not be served yet");
    assert!(matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut));
}

#[then("the second agent receives a success response")]
fn then_second_served(world: &RefCell<ServerWorld>) {
    let mut world = world.borrow_mut();
    let second = world.second.as_mut().expect("second agent connected");
    assert_eq!(
        read_response(second),
        Response::success(json!({"pong": true}))
    );
}

#[scenario(path = "tests/features/command_server.feature", name = "Agent pings the host")]
fn agent_pings_host(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_server.feature",
    name = "Unknown command types are reported"
)]
fn unknown_command_types(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_server.feature",
    name = "Handler errors leave the connection usable"
)]
fn handler_errors_isolated(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_server.feature",
    name = "A second agent waits for the first to leave"
)]
fn second_agent_waits(world: RefCell<ServerWorld>) {
    drop(world);
}
