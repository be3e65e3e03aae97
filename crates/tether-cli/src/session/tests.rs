//! Round-trip behaviour of the session against a scripted host.

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use tether_config::TcpEndpoint;
use tether_protocol::{CommandParams, FrameError, Response};

use super::*;
use crate::tests::support::{FakeHost, Reply};

const SHORT_READ: Duration = Duration::from_millis(200);

fn settings_for(port: u16) -> SessionSettings {
    SessionSettings {
        endpoint: TcpEndpoint::new("127.0.0.1", port),
        connect_timeout: Duration::from_secs(1),
        read_timeout: SHORT_READ,
        max_message_bytes: 64 * 1024,
        probe_before_reuse: true,
    }
}

fn session_for(host: &FakeHost) -> Session {
    Session::new(settings_for(host.port()))
}

#[test]
fn connects_lazily_on_first_command() {
    let host = FakeHost::spawn(Vec::new()).expect("spawn fake host");
    let mut session = session_for(&host);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(host.connections(), 0);

    let result = session
        .send_command("ping", CommandParams::new())
        .expect("round trip");

    assert_eq!(result, json!({"received": "ping"}));
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(host.connections(), 1);
}

#[test]
fn reuses_the_connection_across_commands() {
    let host = FakeHost::spawn(Vec::new()).expect("spawn fake host");
    let mut session = session_for(&host);

    for kind in ["first", "second", "third"] {
        session
            .send_command(kind, CommandParams::new())
            .expect("round trip");
    }

    assert_eq!(host.connections(), 1);
    let kinds: Vec<String> = host
        .commands()
        .expect("commands")
        .into_iter()
        .map(|command| command.kind)
        .collect();
    assert_eq!(kinds, ["first", "second", "third"]);
}

#[test]
fn sends_parameters_in_the_envelope() {
    let host = FakeHost::spawn(Vec::new()).expect("spawn fake host");
    let mut session = session_for(&host);
    let mut params = CommandParams::new();
    params.insert(String::from("name"), json!("Cube"));

    session
        .send_command("get_object_info", params.clone())
        .expect("round trip");

    let commands = host.commands().expect("commands");
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].params, params);
}

#[test]
fn remote_error_keeps_the_connection() {
    let host = FakeHost::spawn(vec![Reply::error("unknown command type: nope")])
        .expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session
        .send_command("nope", CommandParams::new())
        .expect_err("remote error");

    assert!(
        matches!(&error, SessionError::Remote { message } if message == "unknown command type: nope")
    );
    assert!(!error.is_recoverable());
    assert_eq!(session.state(), ConnectionState::Connected);
    session
        .send_command("ping", CommandParams::new())
        .expect("connection still usable");
    assert_eq!(host.connections(), 1);
}

#[test]
fn timeout_invalidates_and_next_call_reconnects() {
    let host = FakeHost::spawn(vec![Reply::Withhold]).expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session
        .send_command("slow", CommandParams::new())
        .expect_err("timeout");

    assert!(matches!(error, SessionError::Timeout { after } if after == SHORT_READ));
    assert!(error.is_recoverable());
    assert_eq!(session.state(), ConnectionState::Faulted);

    let result = session
        .send_command("ping", CommandParams::new())
        .expect("fresh connection answers");
    assert_eq!(result, json!({"received": "ping"}));
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(host.connections(), 2);
    let kinds: Vec<String> = host
        .commands()
        .expect("commands")
        .into_iter()
        .map(|command| command.kind)
        .collect();
    assert_eq!(kinds, ["slow", "ping"], "the timed-out command is not resent");
}

#[rstest]
#[case::not_an_envelope(Reply::Raw(b"[1, 2, 3]".to_vec()))]
#[case::unknown_status(Reply::Raw(br#"{"status":"maybe"}"#.to_vec()))]
fn malformed_response_invalidates(#[case] reply: Reply) {
    let host = FakeHost::spawn(vec![reply]).expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session
        .send_command("ping", CommandParams::new())
        .expect_err("malformed response");

    assert!(matches!(error, SessionError::MalformedResponse(_)));
    assert_eq!(session.state(), ConnectionState::Faulted);
    session
        .send_command("ping", CommandParams::new())
        .expect("reconnects after malformed response");
    assert_eq!(host.connections(), 2);
}

#[test]
fn truncated_response_is_a_framing_error() {
    let host = FakeHost::spawn(vec![Reply::RawThenClose(br#"{"status":"succ"#.to_vec())])
        .expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session
        .send_command("ping", CommandParams::new())
        .expect_err("truncated response");

    assert!(matches!(
        error,
        SessionError::Framing(FrameError::Truncated { pending: 15 })
    ));
    assert_eq!(session.state(), ConnectionState::Faulted);
}

#[test]
fn close_without_response_is_an_io_error() {
    let host = FakeHost::spawn(vec![Reply::RawThenClose(Vec::new())]).expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session
        .send_command("ping", CommandParams::new())
        .expect_err("closed early");

    assert!(
        matches!(&error, SessionError::Io(source) if source.kind() == io::ErrorKind::UnexpectedEof)
    );
    assert_eq!(session.state(), ConnectionState::Faulted);
}

#[test]
fn oversized_response_is_a_framing_error() {
    let big = json!({ "blob": "x".repeat(2048) });
    let host = FakeHost::spawn(vec![Reply::success(big)]).expect("spawn fake host");
    let mut settings = settings_for(host.port());
    settings.max_message_bytes = 256;
    let mut session = Session::new(settings);

    let error = session
        .send_command("ping", CommandParams::new())
        .expect_err("too large");

    assert!(matches!(
        error,
        SessionError::Framing(FrameError::TooLarge { max_size: 256, .. })
    ));
    assert_eq!(session.state(), ConnectionState::Faulted);
}

#[test]
fn probe_replaces_a_connection_the_host_closed() {
    let host = FakeHost::spawn(vec![Reply::RespondThenClose(Response::success(json!(1)))])
        .expect("spawn fake host");
    let mut session = session_for(&host);

    session
        .send_command("first", CommandParams::new())
        .expect("first round trip");
    thread::sleep(Duration::from_millis(50));

    let result = session
        .send_command("second", CommandParams::new())
        .expect("probe reconnects");
    assert_eq!(result, json!({"received": "second"}));
    assert_eq!(host.connections(), 2);
}

#[test]
fn without_probe_a_stale_connection_fails_once() {
    let host = FakeHost::spawn(vec![Reply::RespondThenClose(Response::success(json!(1)))])
        .expect("spawn fake host");
    let mut settings = settings_for(host.port());
    settings.probe_before_reuse = false;
    let mut session = Session::new(settings);

    session
        .send_command("first", CommandParams::new())
        .expect("first round trip");
    thread::sleep(Duration::from_millis(50));

    let error = session
        .send_command("second", CommandParams::new())
        .expect_err("stale connection");
    assert!(error.is_recoverable());
    assert_eq!(session.state(), ConnectionState::Faulted);

    session
        .send_command("third", CommandParams::new())
        .expect("next call reconnects");
    assert_eq!(host.connections(), 2);
}

#[test]
fn connect_failure_leaves_session_disconnected() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind placeholder");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    let mut session = Session::new(settings_for(port));

    let error = session
        .send_command("ping", CommandParams::new())
        .expect_err("nothing listening");

    assert!(matches!(error, SessionError::Connect { .. }));
    assert!(error.is_recoverable());
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[test]
fn disconnect_returns_to_disconnected() {
    let host = FakeHost::spawn(Vec::new()).expect("spawn fake host");
    let mut session = session_for(&host);
    session
        .send_command("ping", CommandParams::new())
        .expect("round trip");

    session.disconnect();

    assert_eq!(session.state(), ConnectionState::Disconnected);
    session
        .send_command("ping", CommandParams::new())
        .expect("reconnects after disconnect");
    assert_eq!(host.connections(), 2);
}

#[test]
fn query_helpers_decode_results() {
    let host = FakeHost::spawn(vec![
        Reply::success(json!({"pong": true})),
        Reply::success(json!({"commands": ["list_commands", "ping"]})),
    ])
    .expect("spawn fake host");
    let mut session = session_for(&host);

    assert_eq!(session.ping().expect("ping"), Pong { pong: true });
    assert_eq!(
        session.list_commands().expect("list"),
        ["list_commands", "ping"]
    );
}

#[test]
fn query_helper_reports_unexpected_shapes_without_dropping() {
    let host = FakeHost::spawn(vec![Reply::success(json!({"pong": "yes"}))])
        .expect("spawn fake host");
    let mut session = session_for(&host);

    let error = session.ping().expect_err("wrong shape");

    assert!(matches!(
        error,
        SessionError::UnexpectedResult { command: "ping", .. }
    ));
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[test]
fn settings_follow_configuration() {
    let config = Config {
        port: 7001,
        read_timeout_ms: 10,
        tick_interval_ms: 100,
        probe_before_reuse: Some(false),
        ..Config::default()
    };
    let session = Session::from_config(&config);
    let settings = session.settings();
    assert_eq!(settings.endpoint.to_string(), "tcp://127.0.0.1:7001");
    assert_eq!(settings.read_timeout, Duration::from_millis(200));
    assert!(!settings.probe_before_reuse);
}
