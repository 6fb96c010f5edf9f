//! Client failures.

use thiserror::Error;

use tether_config::EndpointError;

use crate::dispatch::SignatureError;
use crate::protocol::RemoteError;
use crate::transport::{HandshakeError, TransportError};

/// Failures of the connection itself.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server address could not be resolved.
    #[error(transparent)]
    Resolve(#[from] EndpointError),
    /// Dialling failed for a reason other than the server being down.
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),
    /// The server refused the credentials.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// No connection is open.
    #[error("client is not connected")]
    NotConnected,
    /// Sending or receiving a frame failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Whether the failure means the server went away mid-exchange.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_disconnect(),
            _ => false,
        }
    }
}

/// Failures of a remote call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The server could not dispatch the request, for example an unknown
    /// command.
    #[error("{0}")]
    BadRequest(String),
    /// The callable failed on the server.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The arguments do not fit the proxied member's signature.
    #[error("{command}() {source}")]
    Signature {
        /// Member that was invoked.
        command: String,
        /// Mismatch found locally.
        #[source]
        source: SignatureError,
    },
    /// A returned value did not have the requested type.
    #[error("failed to decode result of '{command}': {source}")]
    Decode {
        /// Command that produced the value.
        command: String,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The proxied member cannot be used this way.
    #[error("{0}")]
    Unsupported(String),
    /// The connection failed in a way retrying cannot fix.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The reconnection policy gave up.
    #[error("server at {endpoint} unreachable after {attempts} attempts")]
    Unreachable {
        /// Address dialled.
        endpoint: String,
        /// Failed attempts made.
        attempts: u32,
    },
}

impl CallError {
    /// Creates a [`CallError::Unsupported`] error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// The forwarded error, when the callable itself failed.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(error) => Some(error),
            _ => None,
        }
    }
}
