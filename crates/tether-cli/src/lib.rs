//! Agent side of the Tether command protocol.
//!
//! [`Session`] manages the connection to the host: it connects lazily, sends
//! one command at a time, waits for the matching response and drops the
//! socket whenever the exchange fails so the next call starts clean. The
//! [`run`] entry point backs the `tether` binary, which sends a single
//! command and prints its result.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;

use tether_config::Config;
use tether_protocol::CommandParams;

mod cli;
mod config;
mod errors;
pub mod session;
mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;
pub use session::{ConnectionState, Session, SessionError, SessionSettings};

#[cfg(test)]
mod tests;

/// Runs the CLI with the given arguments and output streams.
///
/// Exits with status 1 when the host reports an error, 2 when the host could
/// not be reached or the exchange failed, and 64 for invalid invocations.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let outcome = Cli::try_parse_from(split.command_arguments(&args))
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            loader
                .load(&split.config_arguments)
                .map(|config| (cli, config))
        })
        .and_then(|(cli, config)| {
            telemetry::initialise(&config);
            execute(&cli, &config, stdout)
        });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{}", diagnostic(&error));
            error.exit_code()
        }
    }
}

fn execute<W: Write>(cli: &Cli, config: &Config, stdout: &mut W) -> Result<(), AppError> {
    let params = parse_params(cli.params.as_deref())?;
    let mut session = Session::from_config(config);
    let result = session.send_command(&cli.kind, params)?;
    write_result(stdout, &result)
}

fn parse_params(raw: Option<&str>) -> Result<CommandParams, AppError> {
    let Some(raw) = raw else {
        return Ok(CommandParams::new());
    };
    match serde_json::from_str::<Value>(raw).map_err(AppError::InvalidParams)? {
        Value::Object(params) => Ok(params),
        _ => Err(AppError::ParamsNotObject),
    }
}

fn write_result<W: Write>(stdout: &mut W, result: &Value) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(result).map_err(AppError::EncodeOutput)?;
    writeln!(stdout, "{rendered}")
        .and_then(|()| stdout.flush())
        .map_err(AppError::WriteOutput)
}

fn diagnostic(error: &AppError) -> String {
    match error {
        AppError::Session(SessionError::Remote { message }) => format!("error: {message}"),
        AppError::CliUsage(usage) => usage.to_string().trim_end().to_owned(),
        other => format!("tether: {other}"),
    }
}
