//! Callable entries stored in the dispatch table.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use super::{Arguments, Signature};
use crate::protocol::RemoteError;

/// Type-erased callable invoked by the server loop.
pub type Invoker = Arc<dyn Fn(&Arguments) -> Result<Value, RemoteError> + Send + Sync>;

/// A free function offered for registration.
///
/// Functions without a name must be given one when they are registered.
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    signature: Signature,
    doc: Option<String>,
    invoker: Invoker,
}

impl Function {
    /// Wraps a named function accepting any arguments.
    pub fn new<F>(name: &str, function: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.to_owned()),
            ..Self::anonymous(function)
        }
    }

    /// Wraps a function that has no name of its own.
    pub fn anonymous<F>(function: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            signature: Signature::any(),
            doc: None,
            invoker: Arc::new(function),
        }
    }

    /// Declares the accepted parameters.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Attaches documentation shown by `help`.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// The function's own name, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn into_entry(self, name: String) -> DispatchEntry {
        DispatchEntry {
            name,
            signature: self.signature,
            doc: self.doc,
            class_name: None,
            invoker: self.invoker,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}

/// A registered command.
#[derive(Clone)]
pub struct DispatchEntry {
    name: String,
    signature: Signature,
    doc: Option<String>,
    class_name: Option<&'static str>,
    invoker: Invoker,
}

impl DispatchEntry {
    pub(crate) fn bound(
        name: String,
        class_name: &'static str,
        signature: Signature,
        doc: Option<String>,
        invoker: Invoker,
    ) -> Self {
        Self {
            name,
            signature,
            doc,
            class_name: Some(class_name),
            invoker,
        }
    }

    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Documentation, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Class the entry was bound from, for proxied members.
    #[must_use]
    pub const fn class_name(&self) -> Option<&'static str> {
        self.class_name
    }

    /// `Class.name` for proxied members, the bare name otherwise.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.class_name {
            Some(class) => format!("{class}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Help text: the call signature followed by the documentation.
    #[must_use]
    pub fn help(&self) -> String {
        let doc = self.doc.as_deref().unwrap_or("No help available.");
        format!("{}{}\n\n{doc}", self.name, self.signature)
    }

    /// Validates the arguments and runs the callable.
    ///
    /// Panics inside the callable are contained and reported as errors of
    /// kind [`RemoteError::PANIC`].
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` when the arguments do not fit the signature and
    /// whatever error the callable itself produced.
    pub fn invoke(&self, args: &Arguments) -> Result<Value, RemoteError> {
        self.signature
            .bind(args.positional(), args.keywords())
            .map_err(|error| RemoteError::type_error(format!("{}() {error}", self.name)))?;
        panic::catch_unwind(AssertUnwindSafe(|| (self.invoker)(args)))
            .unwrap_or_else(|payload| Err(RemoteError::panic(panic_message(payload.as_ref()))))
    }
}

impl fmt::Debug for DispatchEntry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatchEntry")
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "callable panicked".to_owned())
}
