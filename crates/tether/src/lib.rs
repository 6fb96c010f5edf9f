//! Lightweight authenticated RPC over TCP.
//!
//! A [`Server`] exposes free functions and the methods and properties of live
//! objects under case-insensitive command names. A [`Client`] invokes them as
//! if they were local: return values come back unchanged, failures raised
//! inside a callable come back as a [`RemoteError`] carrying the same kind and
//! message, and dropped connections are reopened transparently.
//!
//! ## Exposing objects
//!
//! Types opt in by implementing [`Proxy`], which describes their public
//! surface once. Registering an instance binds each method under its own name
//! and each property under `get_<name>`, `set_<name>` and `del_<name>`,
//! optionally behind a prefix so several instances of one type can coexist.
//! Clients reuse the same description through [`ClientProxy`] to validate
//! arguments locally and to document members without a round trip.
//!
//! ## Control commands
//!
//! Two commands are always available and can be neither registered nor
//! removed: `help` lists the registry or documents one command, and `close`
//! ends the connection and stops the server.
//!
//! ## Connection model
//!
//! The server serves one connection at a time and listens again once it ends.
//! Connections open with a shared-secret handshake; a mismatch is reported as
//! a connection failure, never as an RPC error.

pub mod binder;
pub mod client;
pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod transport;

pub use binder::{ClassSchema, MemberKind, MemberSchema, Method, Property, Proxy, Surface};
pub use client::{CallError, Client, ClientError, ClientProxy};
pub use dispatch::{
    Arguments, DispatchEntry, DispatchTable, Function, RegistrationError, Signature,
    SignatureError,
};
pub use protocol::{RemoteError, Request, Response, Status};
pub use server::{RunOptions, Server, ServerError, ServerHandle};
pub use telemetry::{TelemetryError, TelemetryHandle};
