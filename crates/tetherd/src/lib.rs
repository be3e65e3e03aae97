//! Host side of the Tether command protocol.
//!
//! A host application embeds a [`CommandServer`] and calls
//! [`CommandServer::tick`] from its own scheduler. Each tick accepts at most
//! one agent, reads at most one chunk and, once a whole JSON command has
//! arrived, dispatches it through a [`Dispatcher`] on the calling thread and
//! writes the JSON response back. Handlers mutate the host through `&mut H`
//! without locking because nothing else touches the host during a tick.
//!
//! [`bootstrap_with`] wires configuration, telemetry, health reporting and the
//! server together into a [`Daemon`]; [`run_daemon`] is the `tetherd` binary's
//! entry point, serving the in-memory reference [`scene`].

mod bootstrap;
pub mod dispatch;
mod health;
mod process;
pub mod scene;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    CommandHandler, ContextRequirement, Dispatcher, HandlerError, HandlerResult, HandlerTable,
    HandlerTableBuilder, Host, NoParams,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{CloseReason, CommandServer, ServerError, TickReport};

#[cfg(test)]
mod tests;
