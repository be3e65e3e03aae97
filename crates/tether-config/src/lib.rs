//! Shared configuration for the Tether host daemon and agent CLI.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then a TOML file
//! selected with `--config-path` or `TETHER_CONFIG_PATH`, then `TETHER_*`
//! environment variables, then command-line flags. Both binaries load the same
//! structure so the agent always dials the endpoint the host listens on.

use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_MESSAGE_BYTES,
    DEFAULT_PORT, DEFAULT_READ_TIMEOUT_MS, DEFAULT_TICK_INTERVAL_MS, DEFAULT_WRITE_TIMEOUT_MS,
    default_log_filter, default_log_format,
};
pub use endpoint::{EndpointParseError, TcpEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Minimum number of host ticks the agent waits for before timing out.
const READ_TIMEOUT_TICK_MARGIN: u32 = 2;

/// Resolved configuration shared by `tetherd` and `tether`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TETHER")]
pub struct Config {
    /// Host the command server binds to and the agent connects to.
    #[serde(default = "defaults::default_host")]
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// TCP port of the command endpoint.
    #[serde(default = "defaults::default_port")]
    #[ortho_config(default = defaults::default_port())]
    pub port: u16,
    /// Interval between host ticks in milliseconds.
    #[serde(default = "defaults::default_tick_interval_ms")]
    #[ortho_config(default = defaults::default_tick_interval_ms())]
    pub tick_interval_ms: u64,
    /// Deadline for the agent to receive a complete response.
    #[serde(default = "defaults::default_read_timeout_ms")]
    #[ortho_config(default = defaults::default_read_timeout_ms())]
    pub read_timeout_ms: u64,
    /// Budget for establishing the agent connection.
    #[serde(default = "defaults::default_connect_timeout_ms")]
    #[ortho_config(default = defaults::default_connect_timeout_ms())]
    pub connect_timeout_ms: u64,
    /// Budget for the server to flush one reply.
    #[serde(default = "defaults::default_write_timeout_ms")]
    #[ortho_config(default = defaults::default_write_timeout_ms())]
    pub write_timeout_ms: u64,
    /// Largest message either endpoint will buffer.
    #[serde(default = "defaults::default_max_message_bytes")]
    #[ortho_config(default = defaults::default_max_message_bytes())]
    pub max_message_bytes: usize,
    /// Probe a cached agent connection before reusing it.
    ///
    /// Unset means the built-in default; read it through
    /// [`Config::probe_before_reuse`].
    #[serde(default)]
    pub probe_before_reuse: Option<bool>,
    /// Registers the optional asset catalog handler group on the host.
    ///
    /// Unset means disabled; read it through [`Config::asset_catalog`].
    #[serde(default)]
    pub asset_catalog: Option<bool>,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: defaults::default_host(),
            port: defaults::default_port(),
            tick_interval_ms: defaults::default_tick_interval_ms(),
            read_timeout_ms: defaults::default_read_timeout_ms(),
            connect_timeout_ms: defaults::default_connect_timeout_ms(),
            write_timeout_ms: defaults::default_write_timeout_ms(),
            max_message_bytes: defaults::default_max_message_bytes(),
            probe_before_reuse: None,
            asset_catalog: None,
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and the other layered
    /// sources.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a source cannot be read or a value does
    /// not parse.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Endpoint the server binds and the agent dials.
    #[must_use]
    pub fn endpoint(&self) -> TcpEndpoint {
        TcpEndpoint::new(self.host.clone(), self.port)
    }

    /// Interval between host ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Read deadline as configured.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Read deadline clamped so the host always gets a couple of ticks to answer.
    #[must_use]
    pub fn effective_read_timeout(&self) -> Duration {
        let floor = self.tick_interval() * READ_TIMEOUT_TICK_MARGIN;
        self.read_timeout().max(floor)
    }

    /// Connect timeout for the agent session.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Write timeout for server replies.
    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Frame size ceiling in bytes.
    #[must_use]
    pub const fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// Whether the agent checks a cached connection before reusing it.
    #[must_use]
    pub fn probe_before_reuse(&self) -> bool {
        self.probe_before_reuse
            .unwrap_or_else(defaults::default_probe_before_reuse)
    }

    /// Whether the host registers the asset catalog handlers.
    #[must_use]
    pub fn asset_catalog(&self) -> bool {
        self.asset_catalog.unwrap_or(false)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
