//! Binds a live instance's surface into dispatch entries.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::schema::{accessor_command, accessor_signature};
use super::{MemberKind, Proxy, is_public};
use crate::dispatch::{Arguments, DispatchEntry, Invoker};
use crate::protocol::RemoteError;

/// Entries derived from one instance.
#[derive(Debug)]
pub(crate) struct BoundInstance {
    pub(crate) class_name: &'static str,
    pub(crate) members: Vec<BoundMember>,
}

/// One bound command and, for accessors, its property.
#[derive(Debug)]
pub(crate) struct BoundMember {
    pub(crate) property: Option<String>,
    pub(crate) entry: DispatchEntry,
}

/// Produces one entry per public method and per existing property accessor.
///
/// Every invoker captures the shared instance and locks it for the duration
/// of the call.
pub(crate) fn bind_instance<T: Proxy>(instance: &Arc<Mutex<T>>, prefix: &str) -> BoundInstance {
    let surface = T::surface();
    let class_name = surface.class_name();
    let mut members = Vec::new();

    for method in surface.methods().iter().filter(|m| is_public(m.name())) {
        let receiver = Arc::clone(instance);
        let call = Arc::clone(&method.call);
        let invoker = into_invoker(move |args| {
            let mut guard = lock(&receiver, class_name)?;
            call(&mut guard, args)
        });
        members.push(BoundMember {
            property: None,
            entry: DispatchEntry::bound(
                format!("{prefix}{}", method.name).to_lowercase(),
                class_name,
                method.signature.clone(),
                method.doc.clone(),
                invoker,
            ),
        });
    }

    for property in surface.properties().iter().filter(|p| is_public(p.name())) {
        let name = format!("{prefix}{}", property.name).to_lowercase();
        let mut accessors: Vec<(MemberKind, Invoker)> = Vec::new();
        if let Some(getter) = &property.getter {
            let receiver = Arc::clone(instance);
            let getter = Arc::clone(getter);
            accessors.push((
                MemberKind::Getter,
                into_invoker(move |_| getter(&*lock(&receiver, class_name)?)),
            ));
        }
        if let Some(setter) = &property.setter {
            let receiver = Arc::clone(instance);
            let setter = Arc::clone(setter);
            accessors.push((
                MemberKind::Setter,
                into_invoker(move |args| {
                    let value = args.value(0, "value").cloned().unwrap_or(Value::Null);
                    let mut guard = lock(&receiver, class_name)?;
                    setter(&mut guard, value)?;
                    Ok(Value::Null)
                }),
            ));
        }
        if let Some(deleter) = &property.deleter {
            let receiver = Arc::clone(instance);
            let deleter = Arc::clone(deleter);
            accessors.push((
                MemberKind::Deleter,
                into_invoker(move |_| {
                    let mut guard = lock(&receiver, class_name)?;
                    deleter(&mut guard)?;
                    Ok(Value::Null)
                }),
            ));
        }
        for (kind, invoker) in accessors {
            members.push(BoundMember {
                property: Some(name.clone()),
                entry: DispatchEntry::bound(
                    accessor_command(kind, &name),
                    class_name,
                    accessor_signature(kind),
                    property.doc.clone(),
                    invoker,
                ),
            });
        }
    }

    BoundInstance {
        class_name,
        members,
    }
}

fn into_invoker<F>(function: F) -> Invoker
where
    F: Fn(&Arguments) -> Result<Value, RemoteError> + Send + Sync + 'static,
{
    Arc::new(function)
}

fn lock<'a, T>(
    instance: &'a Mutex<T>,
    class_name: &str,
) -> Result<MutexGuard<'a, T>, RemoteError> {
    instance.lock().map_err(|_| {
        RemoteError::runtime_error(format!(
            "{class_name} instance is unavailable after a previous call panicked"
        ))
    })
}
