//! Declared call signatures and argument binding.
//!
//! A [`Signature`] lists the parameters a callable accepts. Binding checks an
//! argument list against it the way a dynamic call would: too many positional
//! arguments, unknown or duplicated keywords, and missing required parameters
//! are rejected before the callable runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// How a parameter accepts values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    /// Must be supplied positionally or by keyword.
    Required,
    /// May be omitted, in which case `default` applies.
    Optional {
        /// Value used when the argument is omitted.
        default: Value,
    },
    /// Collects surplus positional arguments.
    Variadic,
    /// Collects surplus keyword arguments.
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name, also accepted as a keyword.
    pub name: String,
    /// Acceptance rule.
    #[serde(flatten)]
    pub kind: ParamKind,
}

impl Param {
    const fn is_positional(&self) -> bool {
        matches!(self.kind, ParamKind::Required | ParamKind::Optional { .. })
    }
}

/// Ordered parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// An empty signature accepting no arguments.
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// A signature accepting any arguments: `(*args, **kwargs)`.
    #[must_use]
    pub fn any() -> Self {
        Self::new().variadic("args").var_keyword("kwargs")
    }

    /// Appends a required parameter.
    #[must_use]
    pub fn required(self, name: &str) -> Self {
        self.push(name, ParamKind::Required)
    }

    /// Appends an optional parameter with a default.
    #[must_use]
    pub fn optional(self, name: &str, default: impl Into<Value>) -> Self {
        self.push(
            name,
            ParamKind::Optional {
                default: default.into(),
            },
        )
    }

    /// Appends a parameter collecting surplus positional arguments.
    #[must_use]
    pub fn variadic(self, name: &str) -> Self {
        self.push(name, ParamKind::Variadic)
    }

    /// Appends a parameter collecting surplus keyword arguments.
    #[must_use]
    pub fn var_keyword(self, name: &str) -> Self {
        self.push(name, ParamKind::VarKeyword)
    }

    fn push(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.to_owned(),
            kind,
        });
        self
    }

    /// Declared parameters in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Default for the named optional parameter.
    #[must_use]
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.params.iter().find_map(|param| match &param.kind {
            ParamKind::Optional { default } if param.name == name => Some(default),
            _ => None,
        })
    }

    /// Checks an argument list against the signature.
    ///
    /// # Errors
    ///
    /// Returns the first [`SignatureError`] found, mirroring the order a
    /// dynamic call checks: positional overflow, keyword conflicts, then
    /// missing required parameters.
    ///
    /// Parameters declared after a variadic one are keyword-only: surplus
    /// positional arguments go to the variadic parameter instead.
    pub fn bind(&self, args: &[Value], kwargs: &Map<String, Value>) -> Result<(), SignatureError> {
        let variadic_at = self
            .params
            .iter()
            .position(|p| matches!(p.kind, ParamKind::Variadic));
        let named: Vec<&Param> = self.params.iter().filter(|p| p.is_positional()).collect();
        let positional_count = self
            .params
            .iter()
            .take(variadic_at.unwrap_or(self.params.len()))
            .filter(|p| p.is_positional())
            .count();
        let accepts_varkw = self
            .params
            .iter()
            .any(|p| matches!(p.kind, ParamKind::VarKeyword));

        if args.len() > positional_count && variadic_at.is_none() {
            return Err(SignatureError::TooManyPositional {
                expected: positional_count,
                given: args.len(),
            });
        }

        let filled_positionally = args.len().min(positional_count);
        let mut filled: Vec<bool> = (0..named.len())
            .map(|index| index < filled_positionally)
            .collect();

        for key in kwargs.keys() {
            match named.iter().position(|param| &param.name == key) {
                Some(index) if index < filled_positionally => {
                    return Err(SignatureError::MultipleValues { name: key.clone() });
                }
                Some(index) => {
                    if let Some(slot) = filled.get_mut(index) {
                        *slot = true;
                    }
                }
                None if accepts_varkw => {}
                None => return Err(SignatureError::UnexpectedKeyword { name: key.clone() }),
            }
        }

        for (param, is_filled) in named.iter().zip(&filled) {
            if !is_filled && matches!(param.kind, ParamKind::Required) {
                return Err(SignatureError::MissingArgument {
                    name: param.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            match &param.kind {
                ParamKind::Required => write!(formatter, "{}", param.name)?,
                ParamKind::Optional { default } => write!(formatter, "{}={default}", param.name)?,
                ParamKind::Variadic => write!(formatter, "*{}", param.name)?,
                ParamKind::VarKeyword => write!(formatter, "**{}", param.name)?,
            }
        }
        formatter.write_str(")")
    }
}

/// Arguments that do not fit a declared signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// More positional arguments than parameters.
    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },
    /// A parameter was given positionally and by keyword.
    #[error("got multiple values for argument '{name}'")]
    MultipleValues { name: String },
    /// A keyword matched no parameter.
    #[error("got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { name: String },
    /// A required parameter was not supplied.
    #[error("missing a required argument: '{name}'")]
    MissingArgument { name: String },
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn measure() -> Signature {
        Signature::new().required("channel").optional("samples", 20)
    }

    fn kwargs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[rstest]
    fn accepts_positional_and_keyword_mix(measure: Signature) {
        assert!(measure.bind(&[json!(1)], &Map::new()).is_ok());
        assert!(measure.bind(&[json!(1), json!(5)], &Map::new()).is_ok());
        assert!(
            measure
                .bind(&[], &kwargs(&[("channel", json!(1)), ("samples", json!(5))]))
                .is_ok()
        );
    }

    #[rstest]
    fn rejects_surplus_positionals(measure: Signature) {
        let error = measure
            .bind(&[json!(1), json!(2), json!(3)], &Map::new())
            .expect_err("three positionals");
        assert_eq!(
            error,
            SignatureError::TooManyPositional {
                expected: 2,
                given: 3
            }
        );
    }

    #[rstest]
    fn rejects_duplicate_values(measure: Signature) {
        let error = measure
            .bind(&[json!(1)], &kwargs(&[("channel", json!(2))]))
            .expect_err("channel twice");
        assert!(matches!(error, SignatureError::MultipleValues { .. }));
    }

    #[rstest]
    fn rejects_unknown_keywords(measure: Signature) {
        let error = measure
            .bind(&[json!(1)], &kwargs(&[("rate", json!(2))]))
            .expect_err("unknown keyword");
        assert_eq!(error.to_string(), "got an unexpected keyword argument 'rate'");
    }

    #[rstest]
    fn rejects_missing_required(measure: Signature) {
        let error = measure.bind(&[], &Map::new()).expect_err("missing channel");
        assert_eq!(
            error,
            SignatureError::MissingArgument {
                name: "channel".to_owned()
            }
        );
    }

    #[test]
    fn catch_all_accepts_anything() {
        let signature = Signature::any();
        assert!(
            signature
                .bind(&[json!(1), json!("a")], &kwargs(&[("x", json!(null))]))
                .is_ok()
        );
    }

    #[test]
    fn parameters_after_variadic_are_keyword_only() {
        let signature = Signature::new()
            .required("first")
            .variadic("rest")
            .optional("sep", " ")
            .required("end");
        assert!(
            signature
                .bind(&[json!(1), json!(2), json!(3)], &kwargs(&[("end", json!("."))]))
                .is_ok()
        );
        assert!(
            signature
                .bind(&[json!(1), json!(2)], &kwargs(&[("sep", json!(",")), ("end", json!("."))]))
                .is_ok()
        );
        let error = signature
            .bind(&[json!(1), json!(2), json!(3)], &Map::new())
            .expect_err("end is keyword-only");
        assert_eq!(
            error,
            SignatureError::MissingArgument {
                name: "end".to_owned()
            }
        );
    }

    #[rstest]
    fn renders_like_a_parameter_list(measure: Signature) {
        assert_eq!(measure.to_string(), "(channel, samples=20)");
        assert_eq!(Signature::any().to_string(), "(*args, **kwargs)");
    }
}
