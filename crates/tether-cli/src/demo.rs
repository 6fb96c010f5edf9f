//! Demonstration surface hosted by `tether serve`.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tether::{
    Arguments, Function, Method, Property, Proxy, RegistrationError, RemoteError, Server,
    Signature, Surface,
};

/// Running sum with a record of every addition.
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    total: i64,
    history: Vec<i64>,
}

impl Accumulator {
    fn add(&mut self, value: i64) -> Result<i64, RemoteError> {
        self.total = self
            .total
            .checked_add(value)
            .ok_or_else(|| RemoteError::value_error("accumulator overflow"))?;
        self.history.push(value);
        Ok(self.total)
    }
}

impl Proxy for Accumulator {
    fn surface() -> Surface<Self> {
        Surface::new("Accumulator")
            .method(
                Method::new("add", |acc: &mut Self, args| {
                    let value: i64 = args.get(0, "value")?;
                    Ok(json!(acc.add(value)?))
                })
                .with_signature(Signature::new().required("value"))
                .with_doc("Adds value to the running total and returns the new total."),
            )
            .method(
                Method::new("reset", |acc: &mut Self, _| {
                    *acc = Self::default();
                    Ok(Value::Null)
                })
                .with_signature(Signature::new())
                .with_doc("Clears the total and its history."),
            )
            .property(
                Property::new("total")
                    .getter(|acc: &Self| Ok(json!(acc.total)))
                    .setter(|acc: &mut Self, value| {
                        acc.total = serde_json::from_value(value)?;
                        acc.history.clear();
                        Ok(())
                    })
                    .deleter(|acc: &mut Self| {
                        acc.total = 0;
                        Ok(())
                    })
                    .with_doc("Current running total."),
            )
            .property(
                Property::new("history")
                    .getter(|acc: &Self| Ok(json!(acc.history)))
                    .with_doc("Values added since the last reset."),
            )
    }
}

fn square(args: &Arguments) -> Result<Value, RemoteError> {
    let x: i64 = args.get(0, "x")?;
    x.checked_mul(x)
        .map(Value::from)
        .ok_or_else(|| RemoteError::value_error(format!("square({x}) overflows")))
}

fn sum(args: &Arguments) -> Result<Value, RemoteError> {
    let a: i64 = args.get(0, "a")?;
    let b: i64 = args.get_or(1, "b", 0)?;
    a.checked_add(b)
        .map(Value::from)
        .ok_or_else(|| RemoteError::value_error("addition overflows"))
}

fn echo(args: &Arguments) -> Result<Value, RemoteError> {
    Ok(Value::Array(args.rest(0).to_vec()))
}

fn fail(args: &Arguments) -> Result<Value, RemoteError> {
    let message: String = args.get_or(0, "message", "failure requested".to_owned())?;
    Err(RemoteError::value_error(message))
}

/// The free functions offered by the demonstration server.
pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("square", square)
            .with_signature(Signature::new().required("x"))
            .with_doc("Returns x squared."),
        Function::new("sum", sum)
            .with_signature(Signature::new().required("a").optional("b", 0))
            .with_doc("Returns a + b."),
        Function::new("echo", echo)
            .with_signature(Signature::new().variadic("values"))
            .with_doc("Returns its arguments as a list."),
        Function::new("fail", fail)
            .with_signature(Signature::new().optional("message", "failure requested"))
            .with_doc("Raises a ValueError carrying message."),
    ]
}

/// Registers the functions and a fresh accumulator.
pub(crate) fn register(
    server: &mut Server,
    prefix: Option<&str>,
) -> Result<Arc<Mutex<Accumulator>>, RegistrationError> {
    for function in functions() {
        server.register(function, None)?;
    }
    let accumulator = Arc::new(Mutex::new(Accumulator::default()));
    server.register_instance(&accumulator, prefix)?;
    Ok(accumulator)
}
