//! Diagnostic logging for the `tether` command.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

use tether_config::Config;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Installs a compact stderr subscriber on first use.
///
/// Results go to stdout, so diagnostics never mix with them. An invalid
/// filter or an already installed subscriber leaves logging as it was.
pub(crate) fn initialise(config: &Config) {
    TELEMETRY_GUARD.get_or_init(|| {
        let Ok(filter) = EnvFilter::try_new(config.log_filter()) else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .without_time()
            .compact()
            .try_init();
    });
}
