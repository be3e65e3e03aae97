//! Handler abstraction and the typed adapter used by registrations.
//!
//! Parameters arrive as a JSON object. [`Typed`] deserialises them into the
//! handler's own parameter struct before the handler runs, so shape errors are
//! reported at the boundary and never reach host code.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tether_protocol::CommandParams;

use super::errors::{HandlerError, HandlerResult};

/// Executes one command type against the host.
pub trait CommandHandler<H> {
    /// Handles a command whose parameters have not been validated yet.
    fn handle(&self, host: &mut H, params: CommandParams) -> HandlerResult;
}

impl<H, F> CommandHandler<H> for F
where
    F: Fn(&mut H, CommandParams) -> HandlerResult,
{
    fn handle(&self, host: &mut H, params: CommandParams) -> HandlerResult {
        self(host, params)
    }
}

/// Adapter that validates parameters into `P` and serialises the `R` result.
pub struct Typed<P, R, F> {
    handler: F,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R, F> Typed<P, R, F> {
    /// Wraps a typed handler function.
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H, P, R, F> CommandHandler<H> for Typed<P, R, F>
where
    P: DeserializeOwned,
    R: Serialize,
    F: Fn(&mut H, P) -> Result<R, HandlerError>,
{
    fn handle(&self, host: &mut H, params: CommandParams) -> HandlerResult {
        let params: P = serde_json::from_value(Value::Object(params))
            .map_err(|error| HandlerError::invalid_params(error.to_string()))?;
        let output = (self.handler)(host, params)?;
        serde_json::to_value(output)
            .map_err(|error| HandlerError::failed(format!("failed to serialise result: {error}")))
    }
}

/// Parameter type for commands that accept no parameters.
#[derive(Debug, Default, Clone, Copy, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}
