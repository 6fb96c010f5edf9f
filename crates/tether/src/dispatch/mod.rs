//! Command registry.
//!
//! The server resolves every request against a [`DispatchTable`]. Free
//! functions enter it wrapped in a [`Function`]; instances enter it through
//! the binder, one [`DispatchEntry`] per exposed method or property accessor.

mod arguments;
mod entry;
mod errors;
mod signature;
mod table;

pub use self::arguments::Arguments;
pub use self::entry::{DispatchEntry, Function, Invoker};
pub use self::errors::RegistrationError;
pub use self::signature::{Param, ParamKind, Signature, SignatureError};
pub use self::table::DispatchTable;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
