//! Client-side stand-ins for proxied classes.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::{CLIENT_TARGET, CallError, Client};
use crate::binder::{ClassSchema, MemberKind, MemberSchema, Proxy, accessor_command};
use crate::dispatch::Signature;
use crate::protocol::normalise_command;

/// Names of the façade's own operations. Members with these names are only
/// reachable through [`ClientProxy::invoke`].
const FACADE_NAMES: [&str; 16] = [
    "call",
    "call_with",
    "close",
    "connect",
    "delete",
    "describe",
    "drain",
    "get",
    "help",
    "invoke",
    "is_closed",
    "members",
    "read",
    "read_raw",
    "set",
    "write",
];

/// A client that knows the surface of one or more proxied classes.
///
/// Known members are checked against their declared signature before any
/// request is sent; unknown names fall through to [`Client::call_with`].
#[derive(Debug)]
pub struct ClientProxy {
    client: Client,
    classes: Vec<ClassSchema>,
}

impl ClientProxy {
    /// Wraps a client with no known classes.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
            classes: Vec::new(),
        }
    }

    /// Adds the surface of `T` as registered on the server with `prefix`.
    #[must_use]
    pub fn of<T: Proxy>(self, prefix: Option<&str>) -> Self {
        self.with_class(ClassSchema::prefixed::<T>(prefix.unwrap_or_default()))
    }

    /// Adds a class description.
    ///
    /// Members that shadow a façade operation or a member added earlier are
    /// reported with a warning.
    #[must_use]
    pub fn with_class(mut self, schema: ClassSchema) -> Self {
        for member in &schema.members {
            if FACADE_NAMES.contains(&member.command.as_str()) {
                warn!(
                    target: CLIENT_TARGET,
                    class = %schema.class_name,
                    member = %member.command,
                    "member shadows a client operation; reach it through invoke"
                );
            } else if self.member(&member.command).is_some() {
                warn!(
                    target: CLIENT_TARGET,
                    class = %schema.class_name,
                    member = %member.command,
                    "member already provided by another class; keeping the first"
                );
            }
        }
        self.classes.push(schema);
        self
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Mutable access to the underlying client.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Unwraps the underlying client.
    #[must_use]
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Every name the proxy answers to: façade operations and known members,
    /// sorted.
    #[must_use]
    pub fn members(&self) -> Vec<String> {
        let mut names: Vec<String> = FACADE_NAMES.iter().map(|&name| name.to_owned()).collect();
        for member in self.classes.iter().flat_map(|class| &class.members) {
            if !names.contains(&member.command) {
                names.push(member.command.clone());
            }
        }
        names.sort();
        names
    }

    /// Local help for a known member, rendered like the server's.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<String> {
        self.member(name).map(|member| {
            let doc = member.doc.as_deref().unwrap_or("No help available.");
            format!("{}{}\n\n{doc}", member.command, member.signature)
        })
    }

    /// Declared signature of a known member.
    #[must_use]
    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.member(name).map(|member| &member.signature)
    }

    /// Invokes a member, validating known signatures locally first.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Signature`] when the arguments do not fit, and
    /// otherwise whatever [`Client::call_with`] returns.
    pub fn invoke(
        &mut self,
        name: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, CallError> {
        let command = normalise_command(name);
        if let Some(member) = self.member(&command) {
            member
                .signature
                .bind(&args, &kwargs)
                .map_err(|source| CallError::Signature {
                    command: command.clone(),
                    source,
                })?;
        }
        self.client.call_with(&command, args, kwargs)
    }

    /// Invokes a member and decodes its result.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Decode`] when the result does not fit `T`, and
    /// otherwise whatever [`ClientProxy::invoke`] returns.
    pub fn invoke_as<T: DeserializeOwned>(
        &mut self,
        name: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<T, CallError> {
        let value = self.invoke(name, args, kwargs)?;
        serde_json::from_value(value).map_err(|source| CallError::Decode {
            command: name.to_owned(),
            source,
        })
    }

    /// Reads a property through its `get_` accessor.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Unsupported`] when the property is known to have
    /// no getter.
    pub fn get(&mut self, property: &str) -> Result<Value, CallError> {
        let command = self.accessor(property, MemberKind::Getter)?;
        self.invoke(&command, Vec::new(), Map::new())
    }

    /// Writes a property through its `set_` accessor.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Unsupported`] when the property is known to have
    /// no setter.
    pub fn set(&mut self, property: &str, value: Value) -> Result<(), CallError> {
        let command = self.accessor(property, MemberKind::Setter)?;
        self.invoke(&command, vec![value], Map::new()).map(drop)
    }

    /// Deletes a property through its `del_` accessor.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Unsupported`] when the property is known to have
    /// no deleter.
    pub fn delete(&mut self, property: &str) -> Result<(), CallError> {
        let command = self.accessor(property, MemberKind::Deleter)?;
        self.invoke(&command, Vec::new(), Map::new()).map(drop)
    }

    fn member(&self, command: &str) -> Option<&MemberSchema> {
        let command = normalise_command(command);
        self.classes.iter().find_map(|class| class.member(&command))
    }

    /// Accessor command for a property. Unknown properties fall back to the
    /// naming convention so they still reach the server.
    fn accessor(&self, property: &str, kind: MemberKind) -> Result<String, CallError> {
        let property = normalise_command(property);
        let mut known = false;
        for member in self.classes.iter().flat_map(|class| &class.members) {
            if member.property.as_deref() != Some(property.as_str()) {
                continue;
            }
            known = true;
            if member.kind == kind {
                return Ok(member.command.clone());
            }
        }
        if known {
            let access = match kind {
                MemberKind::Getter => "readable",
                MemberKind::Setter => "writable",
                MemberKind::Deleter | MemberKind::Method => "deletable",
            };
            return Err(CallError::unsupported(format!(
                "property '{property}' is not {access}"
            )));
        }
        Ok(accessor_command(kind, &property))
    }
}

impl fmt::Display for ClientProxy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes: Vec<&str> = self
            .classes
            .iter()
            .map(|class| class.class_name.as_str())
            .collect();
        write!(
            formatter,
            "Client({}) [{}]",
            self.client.endpoint(),
            classes.join(", ")
        )
    }
}
