//! Argument access for registered callables.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::RemoteError;

/// Positional and keyword arguments of one call.
///
/// Accessors look a parameter up by position first and by keyword second,
/// so callables read their inputs the same way regardless of how the client
/// passed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: Map<String, Value>,
}

impl Arguments {
    /// Bundles an argument list.
    #[must_use]
    pub const fn new(positional: Vec<Value>, keywords: Map<String, Value>) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    /// Arguments made only of positional values.
    #[must_use]
    pub fn positional_only(positional: impl IntoIterator<Item = Value>) -> Self {
        Self::new(positional.into_iter().collect(), Map::new())
    }

    /// Positional values in order.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword values.
    #[must_use]
    pub const fn keywords(&self) -> &Map<String, Value> {
        &self.keywords
    }

    /// Positional values from `index` onwards, as collected by `*args`.
    #[must_use]
    pub fn rest(&self, index: usize) -> &[Value] {
        self.positional.get(index..).unwrap_or_default()
    }

    /// Raw value of a parameter.
    #[must_use]
    pub fn value(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keywords.get(name))
    }

    /// Decodes a required parameter.
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` when the parameter is missing or has the wrong
    /// type.
    pub fn get<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, RemoteError> {
        let value = self
            .value(index, name)
            .ok_or_else(|| RemoteError::type_error(format!("missing a required argument: '{name}'")))?;
        decode(value, name)
    }

    /// Decodes an optional parameter, falling back to `default`.
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` when the parameter is present with the wrong
    /// type.
    pub fn get_or<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
        default: T,
    ) -> Result<T, RemoteError> {
        match self.value(index, name) {
            Some(value) => decode(value, name),
            None => Ok(default),
        }
    }

    /// Number of positional values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Whether no arguments were supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Splits into positional and keyword parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.positional, self.keywords)
    }
}

fn decode<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T, RemoteError> {
    T::deserialize(value).map_err(|error| {
        RemoteError::type_error(format!("invalid value for argument '{name}': {error}"))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Arguments {
        let mut keywords = Map::new();
        keywords.insert("scale".to_owned(), json!(2.5));
        Arguments::new(vec![json!(7), json!("a"), json!(true)], keywords)
    }

    #[test]
    fn reads_positional_then_keyword() {
        let args = sample();
        assert_eq!(args.get::<i64>(0, "x").expect("x"), 7);
        assert!((args.get::<f64>(5, "scale").expect("scale") - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_types_are_type_errors() {
        let error = sample().get::<i64>(1, "y").expect_err("string is not an integer");
        assert!(error.is(RemoteError::TYPE_ERROR));
        assert!(error.message.contains("'y'"));
    }

    #[test]
    fn missing_parameters_use_defaults() {
        assert_eq!(sample().get_or(9, "limit", 10_u32).expect("default"), 10);
        let error = sample().get::<u32>(9, "limit").expect_err("missing");
        assert!(error.message.contains("missing a required argument"));
    }

    #[test]
    fn rest_collects_surplus_positionals() {
        assert_eq!(sample().rest(1), &[json!("a"), json!(true)]);
        assert!(sample().rest(10).is_empty());
    }
}
