//! Error types for the CLI runtime.

use std::io;

use tether::{CallError, ClientError, RegistrationError, ServerError, TelemetryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("keyword argument '{0}' must have the form name=value")]
    MalformedKeyword(String),
    #[error("failed to register demonstration surface: {0}")]
    Register(#[from] RegistrationError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to connect to server at {0}")]
    Unavailable(String),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}
