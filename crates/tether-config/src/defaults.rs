use crate::logging::LogFormat;

/// Default host the command server binds to and the agent connects to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port for the command endpoint.
pub const DEFAULT_PORT: u16 = 9876;

/// Default interval between host ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default deadline for the agent to receive a complete response.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 15_000;

/// Default budget for establishing the agent connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default budget for the server to flush a reply.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

/// Largest message either endpoint will buffer before giving up.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned default host used where allocation is required (e.g. serde).
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default TCP port.
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default tick interval in milliseconds.
pub const fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

/// Default read timeout in milliseconds.
pub const fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

/// Default connect timeout in milliseconds.
pub const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default write timeout in milliseconds.
pub const fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

/// Default frame size ceiling in bytes.
pub const fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}

/// The liveness probe is enabled unless configured otherwise.
pub const fn default_probe_before_reuse() -> bool {
    true
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
