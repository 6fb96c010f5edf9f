//! Request and response frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RemoteError, Status};

type RequestFrame = (String, Vec<Value>, Map<String, Value>);
type ResponseFrame = (Status, Value);

/// A call issued by a client.
///
/// Positional arguments keep their order; keyword arguments are matched by
/// name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RequestFrame", into = "RequestFrame")]
pub struct Request {
    /// Command name as sent by the client.
    pub command: String,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
}

impl Request {
    /// Creates a request without arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Replaces the positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Replaces the keyword arguments.
    #[must_use]
    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Command name lower-cased and trimmed for lookup.
    #[must_use]
    pub fn normalised_command(&self) -> String {
        super::normalise_command(&self.command)
    }
}

impl From<RequestFrame> for Request {
    fn from((command, args, kwargs): RequestFrame) -> Self {
        Self {
            command,
            args,
            kwargs,
        }
    }
}

impl From<Request> for RequestFrame {
    fn from(request: Request) -> Self {
        (request.command, request.args, request.kwargs)
    }
}

/// A server's answer to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResponseFrame", into = "ResponseFrame")]
pub struct Response {
    /// Control status.
    pub status: Status,
    /// Return value, error description or help text depending on `status`.
    pub payload: Value,
}

impl Response {
    /// Successful call carrying the callable's return value.
    #[must_use]
    pub const fn ok(value: Value) -> Self {
        Self {
            status: Status::Ok,
            payload: value,
        }
    }

    /// Local dispatch failure described by text.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: Value::String(message.into()),
        }
    }

    /// Failure raised inside the callable.
    #[must_use]
    pub fn forwarded(error: &RemoteError) -> Self {
        Self {
            status: Status::ErrorForwarded,
            payload: error.to_payload(),
        }
    }

    /// Documentation or registry listing.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            status: Status::Info,
            payload: Value::String(text.into()),
        }
    }

    /// Returns the payload as text, rendering non-string payloads as JSON.
    #[must_use]
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ResponseFrame> for Response {
    fn from((status, payload): ResponseFrame) -> Self {
        Self { status, payload }
    }
}

impl From<Response> for ResponseFrame {
    fn from(response: Response) -> Self {
        (response.status, response.payload)
    }
}
