//! Host bootstrap and the tick loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ortho_config::OrthoError;
use thiserror::Error;

use tether_config::Config;

use crate::dispatch::{Dispatcher, HandlerTable, Host};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{CommandServer, ServerError, TickReport};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The command server could not start listening.
    #[error("failed to start command server: {source}")]
    Server {
        /// Underlying socket error.
        #[source]
        source: ServerError,
    },
}

/// A bootstrapped host: configuration, listening server, dispatcher and host
/// state, ready to be ticked.
pub struct Daemon<H> {
    config: Config,
    server: CommandServer,
    dispatcher: Dispatcher<H>,
    host: H,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<H: Host> Daemon<H> {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Address the command server is bound to while listening.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Host state mutated by handlers.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Command types the dispatcher answers.
    #[must_use]
    pub fn command_types(&self) -> Vec<&str> {
        self.dispatcher.table().command_types()
    }

    /// Runs one server tick on the calling thread.
    pub fn tick(&mut self) -> TickReport {
        let report = self.server.tick(&self.dispatcher, &mut self.host);
        if let Some(peer) = report.accepted {
            self.reporter.client_connected(peer);
        }
        if let Some(reason) = &report.closed {
            self.reporter.client_disconnected(reason);
        }
        report
    }

    /// Ticks at the configured interval until `shutdown` is set, then stops
    /// the server.
    pub fn run_until(&mut self, shutdown: &AtomicBool) {
        let interval = self.config.tick_interval();
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
            thread::sleep(interval);
        }
        self.stop();
    }

    /// Closes the client and the listener. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.server.is_listening() {
            self.server.stop();
            self.reporter.server_stopped();
        }
    }
}

/// Bootstraps a host using the supplied collaborators.
///
/// `install` receives the resolved configuration and returns the host state
/// together with its handler table, so optional handler groups can be gated
/// on configuration.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or the listening
/// socket cannot be set up. The failure is also passed to the reporter.
pub fn bootstrap_with<H, F>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    install: F,
) -> Result<Daemon<H>, BootstrapError>
where
    H: Host,
    F: FnOnce(&Config) -> (H, HandlerTable<H>),
{
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let (host, table) = install(&config);
    let mut server = CommandServer::new(&config);
    let addr = match server.start() {
        Ok(addr) => addr,
        Err(source) => {
            let error = BootstrapError::Server { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };
    reporter.server_listening(addr);
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        server,
        dispatcher: Dispatcher::new(table),
        host,
        telemetry,
        reporter,
    })
}
