//! Name to callable registry consulted by the server loop.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::{DispatchEntry, Function, RegistrationError, DISPATCH_TARGET};
use crate::binder::{self, Proxy};
use crate::protocol::{AUXILIARY_COMMANDS, CLOSE_COMMAND, HELP_COMMAND, normalise_command};

const HELP_DOC: &str = "help(command=None)\n\n\
    Lists the available calls and properties, or shows the documentation of \
    one command.";
const CLOSE_DOC: &str = "close()\n\n\
    Terminates the connection and stops the server from listening again.";

/// Identity of a registered instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InstanceId(usize);

impl InstanceId {
    fn of<T>(instance: &Arc<Mutex<T>>) -> Self {
        Self(Arc::as_ptr(instance).cast::<()>().addr())
    }
}

#[derive(Debug)]
struct InstanceRecord {
    id: InstanceId,
    class_name: &'static str,
    commands: Vec<String>,
}

/// Registry of user commands.
///
/// Names are case-insensitive and unique: the first registration of a name
/// wins and later ones are refused with a warning. The auxiliary commands
/// `help` and `close` are handled by the server loop and can neither be
/// registered nor removed.
#[derive(Debug, Default)]
pub struct DispatchTable {
    entries: BTreeMap<String, DispatchEntry>,
    accessors: BTreeMap<String, String>,
    instances: Vec<InstanceRecord>,
}

impl DispatchTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a user command of this name exists.
    #[must_use]
    pub fn has_registered(&self, name: &str) -> bool {
        self.entries.contains_key(&normalise_command(name))
    }

    /// Looks a user command up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DispatchEntry> {
        self.entries.get(&normalise_command(name))
    }

    /// Registers a free function under `name`, or under its own name.
    ///
    /// Returns `Ok(false)` and logs a warning when the name is taken.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::AnonymousFunction`] when neither the
    /// function nor the caller provides a name.
    pub fn register(
        &mut self,
        function: Function,
        name: Option<&str>,
    ) -> Result<bool, RegistrationError> {
        let name = name
            .or_else(|| function.name())
            .ok_or(RegistrationError::AnonymousFunction)?;
        let name = normalise_command(name);
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let entry = function.into_entry(name);
        Ok(self.insert(entry))
    }

    /// Registers every public member of a live instance.
    ///
    /// Methods register under `{prefix}{name}` and property accessors under
    /// `get_{prefix}{name}`, `set_{prefix}{name}` and `del_{prefix}{name}`.
    /// Members whose command name is already taken are skipped with a warning
    /// and the call returns `Ok(false)`; the remaining members stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InstanceAlreadyRegistered`] when the same
    /// instance is registered twice.
    pub fn register_instance<T: Proxy>(
        &mut self,
        instance: &Arc<Mutex<T>>,
        prefix: Option<&str>,
    ) -> Result<bool, RegistrationError> {
        let id = InstanceId::of(instance);
        let bound = binder::bind_instance(instance, prefix.unwrap_or_default());
        if self.instances.iter().any(|record| record.id == id) {
            return Err(RegistrationError::InstanceAlreadyRegistered {
                class_name: bound.class_name,
            });
        }

        let mut complete = true;
        let mut commands = Vec::new();
        for member in bound.members {
            let command = member.entry.name().to_owned();
            if !self.insert(member.entry) {
                complete = false;
                continue;
            }
            if let Some(property) = member.property {
                self.accessors.insert(command.clone(), property);
            }
            commands.push(command);
        }
        self.instances.push(InstanceRecord {
            id,
            class_name: bound.class_name,
            commands,
        });
        Ok(complete)
    }

    /// Removes a user command.
    ///
    /// Returns `false` with a warning for auxiliary and unknown commands.
    pub fn unregister(&mut self, name: &str) -> bool {
        let name = normalise_command(name);
        if AUXILIARY_COMMANDS.contains(&name.as_str()) {
            warn!(
                target: DISPATCH_TARGET,
                command = %name,
                "core command cannot be unregistered"
            );
            return false;
        }
        if self.entries.remove(&name).is_none() {
            warn!(
                target: DISPATCH_TARGET,
                command = %name,
                "command is not registered; ignored"
            );
            return false;
        }
        self.accessors.remove(&name);
        for record in &mut self.instances {
            record.commands.retain(|command| command != &name);
        }
        true
    }

    /// Removes a function by its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::AnonymousFunction`] for functions without
    /// a name.
    pub fn unregister_function(&mut self, function: &Function) -> Result<bool, RegistrationError> {
        let name = function
            .name()
            .ok_or(RegistrationError::AnonymousFunction)?;
        Ok(self.unregister(name))
    }

    /// Removes every command contributed by an instance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InstanceNotRegistered`] when the instance
    /// was never registered.
    pub fn unregister_instance<T: Proxy>(
        &mut self,
        instance: &Arc<Mutex<T>>,
    ) -> Result<bool, RegistrationError> {
        let id = InstanceId::of(instance);
        let Some(position) = self.instances.iter().position(|record| record.id == id) else {
            return Err(RegistrationError::InstanceNotRegistered {
                class_name: T::surface().class_name(),
            });
        };
        let record = self.instances.remove(position);
        for command in record.commands {
            self.entries.remove(&command);
            self.accessors.remove(&command);
        }
        Ok(true)
    }

    fn insert(&mut self, entry: DispatchEntry) -> bool {
        let name = entry.name().to_owned();
        if self.entries.contains_key(&name) || AUXILIARY_COMMANDS.contains(&name.as_str()) {
            warn!(
                target: DISPATCH_TARGET,
                command = %name,
                "command already registered; ignored"
            );
            return false;
        }
        self.entries.insert(name, entry);
        true
    }

    /// Every user command name, sorted.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// User commands that are not property accessors, sorted.
    #[must_use]
    pub fn calls(&self) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|name| !self.accessors.contains_key(*name))
            .map(String::as_str)
            .collect()
    }

    /// Properties exposed by registered instances, sorted.
    #[must_use]
    pub fn properties(&self) -> Vec<&str> {
        let unique: BTreeSet<&str> = self.accessors.values().map(String::as_str).collect();
        unique.into_iter().collect()
    }

    /// Class names of registered instances, in registration order.
    #[must_use]
    pub fn class_names(&self) -> Vec<&'static str> {
        self.instances.iter().map(|record| record.class_name).collect()
    }

    /// Listing returned by `help` without arguments.
    #[must_use]
    pub fn help_listing(&self) -> String {
        format!(
            "Available calls: {:?}\nAvailable properties: {:?}",
            self.calls(),
            self.properties()
        )
    }

    /// Documentation returned by `help <name>`, including the auxiliary
    /// commands.
    #[must_use]
    pub fn help_for(&self, name: &str) -> Option<String> {
        let name = normalise_command(name);
        match name.as_str() {
            HELP_COMMAND => Some(HELP_DOC.to_owned()),
            CLOSE_COMMAND => Some(CLOSE_DOC.to_owned()),
            _ => self.entries.get(&name).map(DispatchEntry::help),
        }
    }

    /// Number of user commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no user command is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    use super::*;
    use crate::binder::{Method, Property, Surface};
    use crate::dispatch::{Arguments, Signature};

    #[derive(Debug, Default)]
    struct Lamp {
        level: i64,
    }

    impl Proxy for Lamp {
        fn surface() -> Surface<Self> {
            Surface::new("Lamp")
                .method(Method::new("toggle", |lamp: &mut Self, _| {
                    lamp.level = if lamp.level == 0 { 100 } else { 0 };
                    Ok(json!(lamp.level))
                }))
                .property(
                    Property::new("level")
                        .getter(|lamp: &Self| Ok(json!(lamp.level)))
                        .setter(|lamp: &mut Self, value| {
                            lamp.level = serde_json::from_value(value)?;
                            Ok(())
                        }),
                )
        }
    }

    fn constant(name: &str, value: i64) -> Function {
        Function::new(name, move |_| Ok(json!(value)))
    }

    #[fixture]
    fn table() -> DispatchTable {
        let mut table = DispatchTable::new();
        let square = Function::new("square", |args| {
            let x: i64 = args.get(0, "x")?;
            Ok(json!(x * x))
        })
        .with_signature(Signature::new().required("x"))
        .with_doc("Returns x squared.");
        assert!(table.register(square, None).expect("register square"));
        table
    }

    #[rstest]
    fn lookup_is_case_insensitive(table: DispatchTable) {
        assert!(table.has_registered("SQUARE"));
        assert!(table.get(" Square ").is_some());
    }

    #[rstest]
    fn duplicate_registration_keeps_the_first(mut table: DispatchTable) {
        assert!(!table.register(constant("square", 0), None).expect("duplicate"));
        let result = table
            .get("square")
            .expect("square")
            .invoke(&Arguments::positional_only([json!(3)]))
            .expect("call");
        assert_eq!(result, json!(9));
    }

    #[rstest]
    fn explicit_name_overrides_function_name(mut table: DispatchTable) {
        assert!(table.register(constant("one", 1), Some("uno")).expect("register"));
        assert!(table.has_registered("uno"));
        assert!(!table.has_registered("one"));
    }

    #[rstest]
    fn anonymous_functions_need_a_name(mut table: DispatchTable) {
        let anonymous = Function::anonymous(|_| Ok(Value::Null));
        assert_eq!(
            table.register(anonymous.clone(), None),
            Err(RegistrationError::AnonymousFunction)
        );
        assert!(table.register(anonymous, Some("noop")).expect("named"));
    }

    #[rstest]
    #[case(HELP_COMMAND)]
    #[case(CLOSE_COMMAND)]
    fn auxiliary_commands_are_protected(mut table: DispatchTable, #[case] name: &str) {
        assert!(!table.register(constant(name, 1), None).expect("refused"));
        assert!(!table.unregister(name));
    }

    #[rstest]
    fn unregister_removes_and_reports_absent(mut table: DispatchTable) {
        assert!(table.unregister("square"));
        assert!(!table.unregister("square"));
        assert!(table.is_empty());
    }

    #[rstest]
    fn instance_registration_is_exclusive(mut table: DispatchTable) {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        assert!(table.register_instance(&lamp, None).expect("register"));
        assert!(table.has_registered("toggle"));
        assert!(table.has_registered("get_level"));
        assert!(table.has_registered("set_level"));
        assert!(!table.has_registered("del_level"));
        assert_eq!(
            table.register_instance(&lamp, Some("other_")),
            Err(RegistrationError::InstanceAlreadyRegistered { class_name: "Lamp" })
        );
        assert_eq!(table.class_names(), ["Lamp"]);
    }

    #[rstest]
    fn second_instance_needs_a_prefix(mut table: DispatchTable) {
        let first = Arc::new(Mutex::new(Lamp::default()));
        let second = Arc::new(Mutex::new(Lamp::default()));
        table.register_instance(&first, None).expect("first");
        assert!(!table.register_instance(&second, None).expect("clashing"));
        let third = Arc::new(Mutex::new(Lamp::default()));
        assert!(table.register_instance(&third, Some("desk_")).expect("prefixed"));
        assert!(table.has_registered("desk_toggle"));
        assert!(table.has_registered("get_desk_level"));
    }

    #[rstest]
    fn unregistering_an_instance_removes_only_its_commands(mut table: DispatchTable) {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        table.register_instance(&lamp, None).expect("register");
        assert!(table.unregister_instance(&lamp).expect("unregister"));
        assert_eq!(table.commands().collect::<Vec<_>>(), ["square"]);
        assert_eq!(
            table.unregister_instance(&lamp),
            Err(RegistrationError::InstanceNotRegistered { class_name: "Lamp" })
        );
    }

    #[rstest]
    fn listing_folds_accessors_into_properties(mut table: DispatchTable) {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        table.register_instance(&lamp, None).expect("register");
        assert_eq!(
            table.help_listing(),
            "Available calls: [\"square\", \"toggle\"]\nAvailable properties: [\"level\"]"
        );
    }

    #[rstest]
    fn help_covers_user_and_auxiliary_commands(table: DispatchTable) {
        assert_eq!(
            table.help_for("square").as_deref(),
            Some("square(x)\n\nReturns x squared.")
        );
        assert!(
            table
                .help_for("close")
                .is_some_and(|doc| doc.starts_with("close()"))
        );
        assert_eq!(table.help_for("missing"), None);
    }
}
