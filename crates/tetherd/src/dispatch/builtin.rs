//! Commands every host answers regardless of its own handler set.

use serde::Serialize;

use super::errors::HandlerError;
use super::handler::NoParams;
use super::table::{ContextRequirement, HandlerTableBuilder};

/// Liveness probe command.
pub(crate) const PING: &str = "ping";
/// Introspection command listing registered command types.
pub(crate) const LIST_COMMANDS: &str = "list_commands";

#[derive(Debug, Serialize)]
struct Pong {
    pong: bool,
}

#[derive(Debug, Serialize)]
struct CommandList {
    commands: Vec<String>,
}

fn ping<H>(_host: &mut H, _params: NoParams) -> Result<Pong, HandlerError> {
    Ok(Pong { pong: true })
}

pub(crate) fn install<H: 'static>(builder: HandlerTableBuilder<H>) -> HandlerTableBuilder<H> {
    builder.register(PING, ContextRequirement::Any, ping::<H>)
}

pub(crate) fn install_listing<H: 'static>(
    builder: HandlerTableBuilder<H>,
    kinds: Vec<String>,
) -> HandlerTableBuilder<H> {
    builder.register(
        LIST_COMMANDS,
        ContextRequirement::Any,
        move |_host: &mut H, _params: NoParams| {
            Ok::<_, HandlerError>(CommandList {
                commands: kinds.clone(),
            })
        },
    )
}
