//! Serialisable errors forwarded from remote callables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure raised inside a remotely invoked callable.
///
/// Servers send it back with [`Status::ErrorForwarded`] and clients surface it
/// unchanged, so calling code can match on the same `kind` and `message` it
/// would see from a local call.
///
/// [`Status::ErrorForwarded`]: super::Status::ErrorForwarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Error category, for example `TypeError` or `ValueError`.
    pub kind: String,
    /// Human readable description.
    pub message: String,
    /// Optional structured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl RemoteError {
    /// Kind used when arguments do not fit a callable.
    pub const TYPE_ERROR: &'static str = "TypeError";
    /// Kind used when an argument has the right type but an invalid value.
    pub const VALUE_ERROR: &'static str = "ValueError";
    /// Kind used for failures without a more specific category.
    pub const RUNTIME_ERROR: &'static str = "RuntimeError";
    /// Kind used when a callable panicked.
    pub const PANIC: &'static str = "Panic";

    /// Creates an error of an arbitrary kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(Self::TYPE_ERROR, message)
    }

    /// Creates a `ValueError`.
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(Self::VALUE_ERROR, message)
    }

    /// Creates a `RuntimeError`.
    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(Self::RUNTIME_ERROR, message)
    }

    /// Creates the error reported for a panicking callable.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(Self::PANIC, message)
    }

    /// Attaches structured context.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Whether the error has the given kind.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Encodes the error as a response payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut object = Map::new();
        object.insert("kind".to_owned(), Value::String(self.kind.clone()));
        object.insert("message".to_owned(), Value::String(self.message.clone()));
        if let Some(detail) = &self.detail {
            object.insert("detail".to_owned(), detail.clone());
        }
        Value::Object(object)
    }

    /// Rebuilds an error from a response payload.
    ///
    /// Payloads that do not follow the error shape are preserved as the
    /// message of a `RuntimeError`.
    #[must_use]
    pub fn from_payload(payload: Value) -> Self {
        match serde_json::from_value::<Self>(payload.clone()) {
            Ok(error) => error,
            Err(_) => match payload {
                Value::String(message) => Self::runtime_error(message),
                other => Self::runtime_error(other.to_string()),
            },
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(error: serde_json::Error) -> Self {
        Self::type_error(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_round_trip_keeps_kind_message_and_detail() {
        let error = RemoteError::value_error("negative input").with_detail(json!({"x": -1}));
        assert_eq!(RemoteError::from_payload(error.to_payload()), error);
    }

    #[test]
    fn foreign_payloads_become_runtime_errors() {
        let error = RemoteError::from_payload(json!("boom"));
        assert!(error.is(RemoteError::RUNTIME_ERROR));
        assert_eq!(error.message, "boom");
    }

    #[test]
    fn display_includes_kind() {
        let error = RemoteError::type_error("bad operand");
        assert_eq!(error.to_string(), "TypeError: bad operand");
    }
}
