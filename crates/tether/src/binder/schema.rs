//! Serialisable view of a surface used by clients.

use serde::{Deserialize, Serialize};

use super::{Proxy, deleter_name, getter_name, is_public, setter_name};
use crate::dispatch::Signature;

/// Role of a member command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Plain method.
    Method,
    /// Property read accessor.
    Getter,
    /// Property write accessor.
    Setter,
    /// Property delete accessor.
    Deleter,
}

/// One remotely callable member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSchema {
    /// Command name on the server, prefix included.
    pub command: String,
    /// Owning property for accessors, prefix included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Member role.
    pub kind: MemberKind,
    /// Declared parameters.
    pub signature: Signature,
    /// Documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Public members of a class as seen by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    /// Class name.
    pub class_name: String,
    /// Members in declaration order, properties after methods.
    pub members: Vec<MemberSchema>,
}

impl ClassSchema {
    /// Describes `T` without a prefix.
    #[must_use]
    pub fn of<T: Proxy>() -> Self {
        Self::prefixed::<T>("")
    }

    /// Describes `T` as registered with `prefix`.
    #[must_use]
    pub fn prefixed<T: Proxy>(prefix: &str) -> Self {
        let surface = T::surface();
        let mut members = Vec::new();
        for method in surface.methods().iter().filter(|m| is_public(m.name())) {
            members.push(MemberSchema {
                command: format!("{prefix}{}", method.name).to_lowercase(),
                property: None,
                kind: MemberKind::Method,
                signature: method.signature.clone(),
                doc: method.doc.clone(),
            });
        }
        for property in surface.properties().iter().filter(|p| is_public(p.name())) {
            let name = format!("{prefix}{}", property.name).to_lowercase();
            let accessors = [
                (property.getter.is_some(), MemberKind::Getter),
                (property.setter.is_some(), MemberKind::Setter),
                (property.deleter.is_some(), MemberKind::Deleter),
            ];
            for (_, kind) in accessors.into_iter().filter(|(present, _)| *present) {
                members.push(MemberSchema {
                    command: accessor_command(kind, &name),
                    property: Some(name.clone()),
                    kind,
                    signature: accessor_signature(kind),
                    doc: property.doc.clone(),
                });
            }
        }
        Self {
            class_name: surface.class_name().to_owned(),
            members,
        }
    }

    /// Looks a member up by command name.
    #[must_use]
    pub fn member(&self, command: &str) -> Option<&MemberSchema> {
        self.members.iter().find(|member| member.command == command)
    }

    /// Distinct property names, in declaration order.
    #[must_use]
    pub fn properties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for property in self.members.iter().filter_map(|m| m.property.as_deref()) {
            if !names.contains(&property) {
                names.push(property);
            }
        }
        names
    }
}

pub(crate) fn accessor_command(kind: MemberKind, property: &str) -> String {
    match kind {
        MemberKind::Getter => getter_name(property),
        MemberKind::Setter => setter_name(property),
        MemberKind::Deleter => deleter_name(property),
        MemberKind::Method => property.to_owned(),
    }
}

pub(crate) fn accessor_signature(kind: MemberKind) -> Signature {
    match kind {
        MemberKind::Setter => Signature::new().required("value"),
        MemberKind::Method => Signature::any(),
        MemberKind::Getter | MemberKind::Deleter => Signature::new(),
    }
}
