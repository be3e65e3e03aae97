//! Shared collaborators for the host test suites.

use std::ffi::OsString;
use std::fs;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use tether_config::Config;

use crate::bootstrap::{BootstrapError, ConfigLoader, StaticConfigLoader};
use crate::health::HealthReporter;
use crate::transport::CloseReason;

/// Loader for a configuration bound to an ephemeral loopback port.
pub fn ephemeral_loader() -> StaticConfigLoader {
    StaticConfigLoader::new(ephemeral_config())
}

pub fn ephemeral_config() -> Config {
    Config {
        port: 0,
        tick_interval_ms: 5,
        ..Config::default()
    }
}

/// Loader that fails by passing an unparsable flag value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("tetherd"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ])
    }
}

/// Loader that reads a TOML file through the layered `ortho_config` sources.
pub struct FileConfigLoader {
    dir: TempDir,
}

impl FileConfigLoader {
    /// Writes `contents` to a temporary `tetherd.toml`.
    pub fn new(contents: &str) -> Self {
        let dir = TempDir::new().expect("create config dir");
        fs::write(dir.path().join("tetherd.toml"), contents).expect("write config file");
        Self { dir }
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("tetherd"),
            OsString::from("--config-path"),
            self.dir.path().join("tetherd.toml").into_os_string(),
        ])
    }
}

/// Lifecycle events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ServerListening(SocketAddr),
    ClientConnected(SocketAddr),
    ClientDisconnected(CloseReason),
    ServerStopped,
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, addr: SocketAddr) {
        self.record(HealthEvent::ServerListening(addr));
    }

    fn client_connected(&self, peer: SocketAddr) {
        self.record(HealthEvent::ClientConnected(peer));
    }

    fn client_disconnected(&self, reason: &CloseReason) {
        self.record(HealthEvent::ClientDisconnected(reason.clone()));
    }

    fn server_stopped(&self) {
        self.record(HealthEvent::ServerStopped);
    }
}
