//! Loopback TCP command server.
//!
//! The server owns a non-blocking listener and at most one client. It does no
//! work on its own: the host calls [`CommandServer::tick`] from its scheduler
//! and every accept, read, dispatch and reply happens inside that call.

mod client;
mod errors;
mod server;
#[cfg(test)]
mod test_utils;

pub use self::client::CloseReason;
pub use self::errors::ServerError;
pub use self::server::{CommandServer, TickReport};
#[cfg(test)]
pub(crate) use self::test_utils::{
    ServerHarness, TestHost, read_response, test_config, test_dispatcher,
};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
