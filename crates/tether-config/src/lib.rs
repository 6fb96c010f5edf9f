//! Configuration shared by the tether server, client and CLI.
//!
//! The crate owns the value types both ends of a connection must agree on:
//! where the server listens ([`Endpoint`]), the shared [`Secret`] compared at
//! connect time, how diagnostics are rendered ([`LoggingConfig`]) and how a
//! client paces reconnection attempts ([`ReconnectPolicy`]). The [`ConfigArgs`]
//! group lets binaries populate a [`Config`] from command-line flags with
//! environment variable fallbacks.

mod args;
mod defaults;
mod endpoint;
mod logging;
mod reconnect;
mod secret;

pub use args::{ConfigArgs, ConnectionArgs, LoggingArgs, ReconnectArgs};
pub use defaults::{
    DEFAULT_CLIENT_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_RECONNECT_DELAY, DEFAULT_PORT,
    DEFAULT_RECONNECT_DELAY, DEFAULT_SERVER_HOST, default_log_filter, default_log_format,
};
pub use endpoint::{ALL_INTERFACES, Endpoint, EndpointError, LOOPBACK, parse_host};
pub use logging::{LogFormat, LogFormatParseError, LoggingConfig};
pub use reconnect::{Backoff, ReconnectPolicy};
pub use secret::Secret;

use serde::{Deserialize, Serialize};

/// Which end of a connection a configuration describes.
///
/// The role only influences defaults: servers listen on every interface while
/// clients dial the loopback address unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listening side hosting the dispatch table.
    Server,
    /// Dialling side issuing calls.
    Client,
}

impl Role {
    /// Host used when no address is supplied.
    #[must_use]
    pub const fn default_host(self) -> &'static str {
        match self {
            Self::Server => DEFAULT_SERVER_HOST,
            Self::Client => DEFAULT_CLIENT_HOST,
        }
    }
}

/// Resolved configuration for one server or client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address the server listens on or the client dials.
    pub endpoint: Endpoint,
    /// Shared secret compared during the connection handshake.
    #[serde(default)]
    pub secret: Option<Secret>,
    /// Diagnostic output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Client reconnection pacing. Ignored by servers.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl Config {
    /// Default configuration for the given role.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self {
            endpoint: Endpoint::new(role.default_host(), DEFAULT_PORT),
            secret: None,
            logging: LoggingConfig::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Default server configuration listening on every interface.
    #[must_use]
    pub fn server() -> Self {
        Self::for_role(Role::Server)
    }

    /// Default client configuration dialling the loopback address.
    #[must_use]
    pub fn client() -> Self {
        Self::for_role(Role::Client)
    }

    /// Replaces the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<Secret>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Replaces the reconnection policy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Returns the log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.logging.filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.logging.format
    }
}
