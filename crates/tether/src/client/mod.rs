//! Calling side: a synchronous façade over one connection.
//!
//! [`Client::call`] hides transport faults: a refused dial waits out the
//! reconnection policy and a connection dropped mid-exchange is reopened and
//! the request sent again. Only dispatch failures, forwarded errors and
//! authentication failures reach the caller, plus
//! [`CallError::Unreachable`] when a bounded policy runs out of attempts.

mod errors;
mod proxy;

use std::fmt;
use std::thread;

use serde_json::{Map, Value};
use tether_config::{Config, Endpoint, ReconnectPolicy, Secret};
use tracing::{Span, debug, info, info_span};

use crate::protocol::{CLOSE_COMMAND, HELP_COMMAND, RemoteError, Request, Response, Status};
use crate::transport::{self, DialError, FramedStream, auth};

pub use self::errors::{CallError, ClientError};
pub use self::proxy::ClientProxy;

pub(crate) const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Connection to one server.
///
/// ```rust,no_run
/// use serde_json::json;
/// use tether::Client;
/// use tether_config::Config;
///
/// # fn main() -> Result<(), tether::CallError> {
/// let mut client = Client::new(&Config::client().with_secret("abc"));
/// let squared = client.call("square", vec![json!(7)])?;
/// assert_eq!(squared, json!(49));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    endpoint: Endpoint,
    secret: Option<Secret>,
    reconnect: ReconnectPolicy,
    stream: Option<FramedStream>,
    span: Span,
}

impl Client {
    /// Creates a disconnected client. The first call connects.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let span = info_span!(
            target: CLIENT_TARGET,
            "client",
            endpoint = %config.endpoint
        );
        Self {
            endpoint: config.endpoint.clone(),
            secret: config.secret.clone(),
            reconnect: config.reconnect,
            stream: None,
            span,
        }
    }

    /// Address of the server.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Opens the connection unless one is already open.
    ///
    /// Returns `Ok(false)` when the server is not reachable right now, which
    /// callers may retry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Handshake`] when the secrets do not match and
    /// [`ClientError::Resolve`] or [`ClientError::Connect`] for failures that
    /// retrying cannot fix.
    pub fn connect(&mut self) -> Result<bool, ClientError> {
        if self.stream.is_some() {
            return Ok(true);
        }
        let _entered = self.span.enter();
        let mut stream = match transport::connect(&self.endpoint) {
            Ok(stream) => stream,
            Err(DialError::Unavailable(error)) => {
                debug!(target: CLIENT_TARGET, %error, "server unavailable");
                return Ok(false);
            }
            Err(DialError::Resolve(error)) => return Err(ClientError::Resolve(error)),
            Err(DialError::Io(error)) => return Err(ClientError::Connect(error)),
        };
        match auth::answer_challenge(&mut stream, self.secret.as_ref()) {
            Ok(()) => {}
            Err(error) if error.is_disconnect() => {
                debug!(target: CLIENT_TARGET, %error, "server dropped the handshake");
                return Ok(false);
            }
            Err(error) => return Err(ClientError::Handshake(error)),
        }
        info!(target: CLIENT_TARGET, "connected");
        self.stream = Some(stream);
        Ok(true)
    }

    /// Whether no connection is open.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Sends a request without waiting for its response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] without an open connection and a
    /// transport error when sending fails.
    pub fn write(&mut self, request: &Request) -> Result<(), ClientError> {
        self.connection()?.send(request)?;
        Ok(())
    }

    /// Receives the next response undecoded.
    ///
    /// Returns `Ok(None)` when `blocking` is false and nothing is waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] without an open connection and a
    /// transport error when receiving fails or the frame is malformed.
    pub fn read_raw(&mut self, blocking: bool) -> Result<Option<Response>, ClientError> {
        let stream = self.connection()?;
        if !blocking && !stream.poll()? {
            return Ok(None);
        }
        Ok(Some(stream.recv()?))
    }

    /// Receives and interprets the next response.
    ///
    /// `INFO` text is returned as a string value.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::BadRequest`] for `ERROR` responses,
    /// [`CallError::Remote`] for forwarded errors and [`CallError::Client`]
    /// when receiving fails.
    pub fn read(&mut self, blocking: bool) -> Result<Option<Value>, CallError> {
        self.read_raw(blocking)?.map(interpret).transpose()
    }

    /// Discards responses that were written but never read.
    ///
    /// # Errors
    ///
    /// Returns a transport error when receiving fails.
    pub fn drain(&mut self) -> Result<usize, ClientError> {
        let mut discarded = 0;
        while self.read_raw(false)?.is_some() {
            discarded += 1;
        }
        Ok(discarded)
    }

    /// Closes the connection, asking the server to stop when `server` is set.
    ///
    /// Stopping the server opens a connection first when none is open; an
    /// unreachable server is left alone.
    pub fn close(&mut self, server: bool) {
        if server {
            match self.connect() {
                Ok(true) => {}
                Ok(false) => {
                    debug!(target: CLIENT_TARGET, "server unavailable; nothing to close");
                }
                Err(error) => {
                    debug!(target: CLIENT_TARGET, %error, "cannot reach server to close it");
                }
            }
        }
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        let _entered = self.span.enter();
        if server {
            if let Err(error) = stream.send(&Request::new(CLOSE_COMMAND)) {
                debug!(target: CLIENT_TARGET, %error, "close request not delivered");
            }
        }
        stream.shutdown();
        info!(target: CLIENT_TARGET, server, "connection closed");
    }

    /// Calls a command with positional arguments.
    ///
    /// # Errors
    ///
    /// See [`Client::call_with`].
    pub fn call(&mut self, command: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.call_with(command, args, Map::new())
    }

    /// Calls a command, reconnecting as the policy allows.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::BadRequest`] when the server cannot dispatch the
    /// command, [`CallError::Remote`] when the callable fails,
    /// [`CallError::Unreachable`] when a bounded reconnection policy is
    /// exhausted and [`CallError::Client`] for authentication failures.
    pub fn call_with(
        &mut self,
        command: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, CallError> {
        let request = Request::new(command).with_args(args).with_kwargs(kwargs);
        let span = self.span.clone();
        let _entered = span.enter();
        let mut failures = 0_u32;
        loop {
            if !self.connect()? {
                self.record_failure(&mut failures)?;
                thread::sleep(self.reconnect.delay_for(failures - 1));
                continue;
            }
            match self.exchange(&request) {
                Ok(response) => return interpret(response),
                Err(error) if error.is_disconnect() => {
                    debug!(target: CLIENT_TARGET, command, %error, "connection lost; retrying");
                    self.discard();
                    self.record_failure(&mut failures)?;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Help text for one command, or the full listing.
    ///
    /// # Errors
    ///
    /// See [`Client::call_with`].
    pub fn help(&mut self, command: Option<&str>) -> Result<String, CallError> {
        let args = command.map(|name| Value::String(name.to_owned())).into_iter().collect();
        match self.call(HELP_COMMAND, args)? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    fn exchange(&mut self, request: &Request) -> Result<Response, ClientError> {
        let stream = self.connection()?;
        stream.send(request)?;
        Ok(stream.recv()?)
    }

    fn record_failure(&self, failures: &mut u32) -> Result<(), CallError> {
        *failures = failures.saturating_add(1);
        if self.reconnect.allows(*failures) {
            return Ok(());
        }
        Err(CallError::Unreachable {
            endpoint: self.endpoint.to_string(),
            attempts: *failures,
        })
    }

    fn connection(&mut self) -> Result<&mut FramedStream, ClientError> {
        self.stream.as_mut().ok_or(ClientError::NotConnected)
    }

    fn discard(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.shutdown();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.discard();
    }
}

impl fmt::Display for Client {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Client({})", self.endpoint)
    }
}

fn interpret(response: Response) -> Result<Value, CallError> {
    match response.status {
        Status::Ok => Ok(response.payload),
        Status::Info => Ok(Value::String(response.payload_text())),
        Status::Error => Err(CallError::BadRequest(response.payload_text())),
        Status::ErrorForwarded => Err(CallError::Remote(RemoteError::from_payload(
            response.payload,
        ))),
    }
}
