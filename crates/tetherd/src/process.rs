//! Process entry point: configuration, signals and the host loop.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use thiserror::Error;
use tracing::info;

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::scene;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while launching the host process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Signals {
        /// Underlying registration error.
        #[source]
        source: io::Error,
    },
}

/// Runs the reference scene host until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns [`LaunchError`] when signal handlers cannot be installed or
/// bootstrap fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .map_err(|source| LaunchError::Signals { source })?;
    }
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &shutdown,
    )
}

pub(crate) fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &AtomicBool,
) -> Result<(), LaunchError> {
    let mut daemon = bootstrap_with(loader, reporter, scene::install)?;
    info!(
        target: PROCESS_TARGET,
        commands = ?daemon.command_types(),
        "serving commands"
    );
    daemon.run_until(shutdown);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
