//! Error type for the CLI runtime.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use crate::session::SessionError;

/// Exit status when the host answered with an error response.
pub(crate) const EXIT_REMOTE: u8 = 1;
/// Exit status when the host could not be reached or the exchange failed.
pub(crate) const EXIT_TRANSPORT: u8 = 2;
/// Exit status for invalid invocations (`EX_USAGE`).
pub(crate) const EXIT_USAGE: u8 = 64;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("PARAMS_JSON is not valid JSON: {0}")]
    InvalidParams(serde_json::Error),
    #[error("PARAMS_JSON must be a JSON object")]
    ParamsNotObject,
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("failed to write result: {0}")]
    WriteOutput(io::Error),
    #[error("failed to encode result: {0}")]
    EncodeOutput(serde_json::Error),
}

impl AppError {
    /// Exit status reported for this error.
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::Session(SessionError::Remote { .. }) => ExitCode::from(EXIT_REMOTE),
            Self::Session(_) | Self::WriteOutput(_) | Self::EncodeOutput(_) => {
                ExitCode::from(EXIT_TRANSPORT)
            }
            Self::LoadConfiguration(_)
            | Self::CliUsage(_)
            | Self::InvalidParams(_)
            | Self::ParamsNotObject => ExitCode::from(EXIT_USAGE),
        }
    }
}
