//! Declarative description of a type's remotely callable surface.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::{Arguments, Signature};
use crate::protocol::RemoteError;

type MethodFn<T> = Arc<dyn Fn(&mut T, &Arguments) -> Result<Value, RemoteError> + Send + Sync>;
type GetterFn<T> = Arc<dyn Fn(&T) -> Result<Value, RemoteError> + Send + Sync>;
type SetterFn<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), RemoteError> + Send + Sync>;
type DeleterFn<T> = Arc<dyn Fn(&mut T) -> Result<(), RemoteError> + Send + Sync>;

/// Types whose instances can be registered on a server.
///
/// # Example
///
/// ```rust,ignore
/// impl Proxy for Counter {
///     fn surface() -> Surface<Self> {
///         Surface::new("Counter")
///             .method(Method::new("bump", |counter: &mut Counter, _| {
///                 counter.count += 1;
///                 Ok(json!(counter.count))
///             }))
///             .property(Property::new("count").getter(|counter| Ok(json!(counter.count))))
///     }
/// }
/// ```
pub trait Proxy: Sized + Send + 'static {
    /// Describes the public methods and properties of the type.
    fn surface() -> Surface<Self>;
}

/// Public methods and properties of `T`.
pub struct Surface<T> {
    class_name: &'static str,
    methods: Vec<Method<T>>,
    properties: Vec<Property<T>>,
}

impl<T> Surface<T> {
    /// Starts an empty surface for the named class.
    #[must_use]
    pub const fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: Method<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: Property<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Class name used in diagnostics and listings.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Declared methods, internal ones included.
    #[must_use]
    pub fn methods(&self) -> &[Method<T>] {
        &self.methods
    }

    /// Declared properties, internal ones included.
    #[must_use]
    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }
}

impl<T> fmt::Debug for Surface<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Surface")
            .field("class_name", &self.class_name)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .finish()
    }
}

/// A method operating on a captured receiver.
pub struct Method<T> {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) doc: Option<String>,
    pub(crate) call: MethodFn<T>,
}

impl<T> Method<T> {
    /// Wraps a method accepting any arguments.
    pub fn new<F>(name: &str, call: F) -> Self
    where
        F: Fn(&mut T, &Arguments) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_owned(),
            signature: Signature::any(),
            doc: None,
            call: Arc::new(call),
        }
    }

    /// Declares the accepted parameters, receiver excluded.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Attaches documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Method<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}

/// A property with up to three accessors.
pub struct Property<T> {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) getter: Option<GetterFn<T>>,
    pub(crate) setter: Option<SetterFn<T>>,
    pub(crate) deleter: Option<DeleterFn<T>>,
}

impl<T> Property<T> {
    /// Starts a property without accessors.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            doc: None,
            getter: None,
            setter: None,
            deleter: None,
        }
    }

    /// Read accessor, exposed as `get_<name>`.
    #[must_use]
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&T) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Write accessor, exposed as `set_<name>`.
    #[must_use]
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<(), RemoteError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Delete accessor, exposed as `del_<name>`.
    #[must_use]
    pub fn deleter<F>(mut self, deleter: F) -> Self
    where
        F: Fn(&mut T) -> Result<(), RemoteError> + Send + Sync + 'static,
    {
        self.deleter = Some(Arc::new(deleter));
        self
    }

    /// Attaches documentation shared by all accessors.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Property")
            .field("name", &self.name)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("deleter", &self.deleter.is_some())
            .finish()
    }
}
