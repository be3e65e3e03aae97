//! Lifecycle event reporting.

use std::net::SocketAddr;
use std::sync::Arc;

use tether_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::CloseReason;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for host lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the server is listening and handlers are installed.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when the listening socket opens.
    fn server_listening(&self, addr: SocketAddr);

    /// Invoked when a client is accepted.
    fn client_connected(&self, peer: SocketAddr);

    /// Invoked when the client is dropped for any reason.
    fn client_disconnected(&self, reason: &CloseReason);

    /// Invoked after the listening socket closes.
    fn server_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_listening(&self, addr: SocketAddr) {
        (**self).server_listening(addr);
    }

    fn client_connected(&self, peer: SocketAddr) {
        (**self).client_connected(peer);
    }

    fn client_disconnected(&self, reason: &CloseReason) {
        (**self).client_disconnected(reason);
    }

    fn server_stopped(&self) {
        (**self).server_stopped();
    }
}

/// Reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            endpoint = %config.endpoint(),
            tick_interval_ms = config.tick_interval_ms,
            asset_catalog = config.asset_catalog(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "host bootstrap failed"
        );
    }

    fn server_listening(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_listening",
            addr = %addr,
            "command server accepting agents"
        );
    }

    fn client_connected(&self, peer: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_connected",
            peer = %peer,
            "agent connected"
        );
    }

    fn client_disconnected(&self, reason: &CloseReason) {
        if reason.is_framing_error() {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "client_disconnected",
                reason = %reason,
                "agent dropped after framing error"
            );
        } else {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "client_disconnected",
                reason = %reason,
                "agent disconnected"
            );
        }
    }

    fn server_stopped(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_stopped",
            "command server stopped"
        );
    }
}
