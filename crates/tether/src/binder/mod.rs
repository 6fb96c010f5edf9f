//! Explicit reflection over object surfaces.
//!
//! A type opts into remote exposure by implementing [`Proxy`], describing its
//! public methods and properties once as a [`Surface`]. The server binds a
//! live instance's surface into dispatch entries; the client reads the same
//! description as a serialisable [`ClassSchema`] to build local stand-ins.
//!
//! Members whose name starts with `_` are internal and never exposed.

mod bind;
mod schema;
mod surface;

pub use self::schema::{ClassSchema, MemberKind, MemberSchema};
pub use self::surface::{Method, Property, Proxy, Surface};
pub(crate) use self::bind::bind_instance;
pub(crate) use self::schema::accessor_command;

/// Prefix of members that are never exposed.
pub const INTERNAL_MARKER: char = '_';

/// Accessor naming shared by the server binder and client proxy.
pub(crate) fn getter_name(property: &str) -> String {
    format!("get_{property}")
}

pub(crate) fn setter_name(property: &str) -> String {
    format!("set_{property}")
}

pub(crate) fn deleter_name(property: &str) -> String {
    format!("del_{property}")
}

pub(crate) fn is_public(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(INTERNAL_MARKER)
}

#[cfg(test)]
mod tests;
