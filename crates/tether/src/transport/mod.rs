//! Framed TCP transport shared by the server and client.
//!
//! Connections carry newline-delimited JSON frames in a [`FramedStream`]. The
//! server side binds a listener and accepts one connection at a time; the
//! client side dials the endpoint. Both ends run the secret handshake before
//! any request is exchanged.

pub(crate) mod auth;
mod connect;
mod errors;
mod framed;
mod listener;

pub use self::errors::{HandshakeError, ListenerError, TransportError};
pub use self::framed::{FramedStream, MAX_FRAME_BYTES};
pub(crate) use self::connect::{DialError, connect};
pub(crate) use self::listener::Listener;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
