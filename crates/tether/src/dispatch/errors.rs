//! Registration failures.

use thiserror::Error;

/// Programming errors reported synchronously by `register`/`unregister`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A function without a name was registered without an explicit one.
    #[error("a name must be given for anonymous functions")]
    AnonymousFunction,
    /// The supplied name is empty.
    #[error("command names must not be empty")]
    EmptyName,
    /// The same instance was registered twice.
    #[error("instance of '{class_name}' is already registered")]
    InstanceAlreadyRegistered { class_name: &'static str },
    /// The instance was never registered.
    #[error("instance of '{class_name}' is not registered")]
    InstanceNotRegistered { class_name: &'static str },
}
