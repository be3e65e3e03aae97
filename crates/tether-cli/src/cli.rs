//! Argument definitions for the `tether` command.

use clap::Parser;

/// Sends one command to the Tether host and prints the result.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about)]
pub(crate) struct Cli {
    /// Command type, for example `ping` or `get_object_info`.
    #[arg(value_name = "TYPE")]
    pub(crate) kind: String,
    /// Command parameters as a JSON object.
    #[arg(value_name = "PARAMS_JSON")]
    pub(crate) params: Option<String>,
}
