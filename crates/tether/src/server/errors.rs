//! Server failures.

use std::io;

use thiserror::Error;

use crate::transport::ListenerError;

/// Failures that stop a server from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The start-up banner could not be written.
    #[error("failed to write server banner: {0}")]
    Banner(#[source] io::Error),
    /// The background worker could not be started.
    #[error("failed to spawn server thread: {0}")]
    Spawn(#[source] io::Error),
    /// The background worker panicked.
    #[error("server thread panicked")]
    ThreadPanic,
}
