//! Configuration loading for the `tether` command.
//!
//! Configuration flags must precede the command type. Everything from the
//! first argument that is not a recognised configuration flag onwards is
//! parsed by [`crate::cli::Cli`], so parameters that happen to look like
//! flags are never swallowed by the loader.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use tether_config::Config;

use crate::errors::AppError;

/// Value-taking flags understood by the configuration loader.
///
/// Keep in sync with the fields of [`tether_config::Config`]. Boolean
/// toggles are left to the file and environment layers.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--host",
    "--port",
    "--tick-interval-ms",
    "--read-timeout-ms",
    "--connect-timeout-ms",
    "--write-timeout-ms",
    "--max-message-bytes",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads layered configuration through `ortho_config`.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and the command parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the recognised configuration flags.
    pub(crate) config_arguments: Vec<OsString>,
    /// Index of the first command argument.
    pub(crate) command_start: usize,
}

impl ConfigArgumentSplit {
    /// Program name followed by the command arguments, ready for `clap`.
    pub(crate) fn command_arguments(&self, args: &[OsString]) -> Vec<OsString> {
        args.first()
            .into_iter()
            .chain(args.iter().skip(self.command_start))
            .cloned()
            .collect()
    }
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut config_arguments: Vec<OsString> = args.first().cloned().into_iter().collect();
    let mut remaining = args.iter().enumerate().skip(1);
    let mut command_start = args.len().min(1);

    while let Some((index, argument)) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                command_start = index + 1;
                if needs_value {
                    if let Some((value_index, value)) = remaining.next() {
                        config_arguments.push(value.clone());
                        command_start = value_index + 1;
                    }
                }
            }
            FlagAction::Stop => break,
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}
