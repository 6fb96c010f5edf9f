//! Error types for transport operations.

use std::io;
use std::net::SocketAddr;

use tether_config::EndpointError;
use thiserror::Error;

/// Failures while moving frames over an established connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,
    /// The peer reset or abandoned the connection.
    #[error("connection reset by peer: {0}")]
    Reset(#[source] io::Error),
    /// Any other socket failure.
    #[error("transport IO error: {0}")]
    Io(#[source] io::Error),
    /// A frame exceeded the size limit.
    #[error("frame exceeds {max} byte limit")]
    FrameTooLarge { max: usize },
    /// A frame could not be serialised.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    /// A received frame was not valid for the expected message type.
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

impl TransportError {
    /// Classifies a socket error.
    #[must_use]
    pub fn from_io(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Self::Closed,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Reset(error),
            _ => Self::Io(error),
        }
    }

    /// Whether the failure means the peer went away.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Closed | Self::Reset(_))
    }
}

/// Failures while binding or accepting on the server socket.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured endpoint could not be resolved.
    #[error(transparent)]
    Resolve(#[from] EndpointError),
    /// The socket could not be bound.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Accepting a connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),
    /// The bound address could not be read back.
    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// Failures while establishing the shared-secret handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The secrets on both ends differ.
    #[error("authentication failed: secret mismatch")]
    Rejected,
    /// The server demands a secret but the client has none.
    #[error("authentication failed: server requires a secret")]
    SecretRequired,
    /// The client has a secret but the server does not check one.
    #[error("authentication failed: server does not accept a secret")]
    SecretUnexpected,
    /// The peer sent a frame out of sequence.
    #[error("unexpected handshake frame: {0}")]
    Unexpected(String),
    /// The connection failed mid-handshake.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HandshakeError {
    /// Whether the handshake failed because the peer went away.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_disconnect(),
            _ => false,
        }
    }
}
