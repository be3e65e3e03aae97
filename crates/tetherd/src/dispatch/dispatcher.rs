//! Routes decoded commands to their registered handlers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, error, warn};

use tether_protocol::{Command, Response};

use super::DISPATCH_TARGET;
use super::context::Host;
use super::errors::HandlerResult;
use super::table::{ContextRequirement, HandlerTable};

/// Turns commands into responses using a fixed [`HandlerTable`].
///
/// Every failure mode, including a panicking handler, becomes an error
/// [`Response`]; nothing escapes to the server loop.
#[derive(Debug)]
pub struct Dispatcher<H> {
    table: HandlerTable<H>,
}

impl<H: Host> Dispatcher<H> {
    /// Creates a dispatcher over a built table.
    #[must_use]
    pub const fn new(table: HandlerTable<H>) -> Self {
        Self { table }
    }

    /// Handler registrations consulted by this dispatcher.
    #[must_use]
    pub const fn table(&self) -> &HandlerTable<H> {
        &self.table
    }

    /// Decodes a received JSON document and dispatches it.
    ///
    /// Documents that are not a command envelope are answered with an error
    /// response rather than dropped.
    pub fn dispatch_value(&self, host: &mut H, value: Value) -> Response {
        match Command::from_value(value) {
            Ok(command) => self.dispatch(host, command),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected malformed command envelope");
                Response::error(format!("invalid command envelope: {error}"))
            }
        }
    }

    /// Runs the handler registered for `command.kind`.
    pub fn dispatch(&self, host: &mut H, command: Command) -> Response {
        let Command { kind, params } = command;
        let Some(registration) = self.table.get(&kind) else {
            debug!(target: DISPATCH_TARGET, command = %kind, "unknown command type");
            return Response::error(format!("unknown command type: {kind}"));
        };

        let handler = &registration.handler;
        let mut params = Some(params);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> HandlerResult {
            match registration.context {
                ContextRequirement::Any => handler.handle(host, params.take().unwrap_or_default()),
                ContextRequirement::Active => host.with_active_context(&kind, &mut |host| {
                    handler.handle(host, params.take().unwrap_or_default())
                }),
            }
        }));

        match outcome {
            Ok(Ok(result)) => {
                debug!(target: DISPATCH_TARGET, command = %kind, "command succeeded");
                Response::success(result)
            }
            Ok(Err(failure)) => {
                debug!(target: DISPATCH_TARGET, command = %kind, error = %failure, "command failed");
                Response::error(failure.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(target: DISPATCH_TARGET, command = %kind, panic = %message, "handler panicked");
                Response::error(format!("handler for {kind} panicked: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
