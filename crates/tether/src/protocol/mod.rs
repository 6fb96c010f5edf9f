//! Message shapes exchanged between clients and servers.
//!
//! Every frame is a single line of JSON. Requests are encoded as the array
//! `[command, [args...], {kwargs...}]` and responses as `[status, payload]`:
//!
//! ```json
//! ["square",[7],{}]
//! [200,49]
//! ```
//!
//! Before the first request the server greets the client with a
//! [`Handshake`] frame, challenging it to prove knowledge of the shared
//! secret when one is configured.

mod error;
mod handshake;
mod message;
mod status;

pub use self::error::RemoteError;
pub use self::handshake::{Handshake, digest, generate_nonce, verify_digest};
pub use self::message::{Request, Response};
pub use self::status::{Status, UnknownStatus};

/// Control command listing the registry or documenting one command.
pub const HELP_COMMAND: &str = "help";

/// Control command terminating the connection and the server.
pub const CLOSE_COMMAND: &str = "close";

/// Commands handled by the server loop itself. They cannot be registered or
/// unregistered.
pub const AUXILIARY_COMMANDS: [&str; 2] = [HELP_COMMAND, CLOSE_COMMAND];

/// Normalises a command name for registration and lookup.
#[must_use]
pub fn normalise_command(command: &str) -> String {
    command.trim().to_lowercase()
}
