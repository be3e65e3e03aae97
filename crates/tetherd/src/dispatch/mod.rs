//! Command dispatch for the host.
//!
//! A [`HandlerTable`] maps each command type to a handler and records whether
//! the handler must run inside the host's active context. The [`Dispatcher`]
//! looks up the handler for an incoming [`tether_protocol::Command`], runs it
//! against the [`Host`], and converts the outcome into a
//! [`tether_protocol::Response`]:
//!
//! ```json
//! {"type": "get_object_info", "params": {"name": "Cube"}}
//! {"status": "success", "result": {"name": "Cube", "type": "MESH"}}
//! ```
//!
//! Unknown types, invalid parameters, handler failures and handler panics all
//! produce `{"status": "error", "message": ...}`.

mod builtin;
mod context;
mod dispatcher;
mod errors;
mod handler;
mod table;

pub use self::context::Host;
pub use self::dispatcher::Dispatcher;
pub use self::errors::{HandlerError, HandlerResult};
pub use self::handler::{CommandHandler, NoParams, Typed};
pub use self::table::{ContextRequirement, HandlerTable, HandlerTableBuilder};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
