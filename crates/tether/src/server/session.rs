//! Per-connection request handling.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::SERVER_TARGET;
use crate::dispatch::{Arguments, DispatchTable};
use crate::protocol::{CLOSE_COMMAND, HELP_COMMAND, Request, Response};
use crate::transport::{FramedStream, TransportError};

/// What the loop does after one request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    /// Write the response and wait for the next request.
    Respond(Response),
    /// Close the connection and stop listening.
    Close,
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The client went away.
    Disconnected,
    /// The client sent `close`.
    Closed,
}

/// Serves requests until the client disconnects or sends `close`.
///
/// Failures raised by callables are answered and never end the loop; only
/// connection-level failures do.
pub(crate) fn serve(
    stream: &mut FramedStream,
    table: &DispatchTable,
) -> Result<Outcome, TransportError> {
    loop {
        let line = match stream.recv_line() {
            Ok(line) => line,
            Err(error) if error.is_disconnect() => {
                info!(target: SERVER_TARGET, "client disconnected");
                return Ok(Outcome::Disconnected);
            }
            Err(error) => return Err(error),
        };
        let action = match serde_json::from_slice::<Request>(&line) {
            Ok(request) => dispatch(table, request),
            Err(error) => {
                warn!(target: SERVER_TARGET, %error, "malformed request frame");
                Action::Respond(Response::error(format!("Malformed request: {error}")))
            }
        };
        match action {
            Action::Respond(response) => match stream.send(&response) {
                Ok(()) => {}
                Err(error) if error.is_disconnect() => {
                    info!(target: SERVER_TARGET, "client disconnected before the response");
                    return Ok(Outcome::Disconnected);
                }
                Err(error) => return Err(error),
            },
            Action::Close => {
                info!(target: SERVER_TARGET, "close requested by client");
                stream.shutdown();
                return Ok(Outcome::Closed);
            }
        }
    }
}

/// Resolves one request against the table.
pub(crate) fn dispatch(table: &DispatchTable, request: Request) -> Action {
    let command = request.normalised_command();
    let Request { args, kwargs, .. } = request;
    match command.as_str() {
        CLOSE_COMMAND => Action::Close,
        HELP_COMMAND => {
            let target = args.first().or_else(|| kwargs.get("command"));
            Action::Respond(help(table, target))
        }
        _ => Action::Respond(invoke(table, &command, Arguments::new(args, kwargs))),
    }
}

fn help(table: &DispatchTable, target: Option<&Value>) -> Response {
    let name = match target {
        None | Some(Value::Null) => return Response::info(table.help_listing()),
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
    };
    match table.help_for(&name) {
        Some(doc) => Response::info(doc),
        None => Response::info(format!(
            "{}\n{}",
            not_registered(&name),
            table.help_listing()
        )),
    }
}

fn invoke(table: &DispatchTable, command: &str, args: Arguments) -> Response {
    let Some(entry) = table.get(command) else {
        debug!(target: SERVER_TARGET, command, "unknown command");
        return Response::error(not_registered(command));
    };
    match entry.invoke(&args) {
        Ok(value) => Response::ok(value),
        Err(error) => {
            debug!(
                target: SERVER_TARGET,
                command = %entry.qualified_name(),
                %error,
                "callable failed; forwarding error"
            );
            Response::forwarded(&error)
        }
    }
}

fn not_registered(command: &str) -> String {
    format!("Command '{command}' is not registered.")
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::dispatch::{Function, Signature};
    use crate::protocol::{RemoteError, Status};

    #[fixture]
    fn table() -> DispatchTable {
        let mut table = DispatchTable::new();
        let square = Function::new("square", |args| {
            let x: i64 = args.get(0, "x")?;
            Ok(json!(x * x))
        })
        .with_signature(Signature::new().required("x"))
        .with_doc("Returns x squared.");
        let fail = Function::new("fail", |_| Err(RemoteError::value_error("bad input")));
        table.register(square, None).expect("square");
        table.register(fail, None).expect("fail");
        table
    }

    fn respond(table: &DispatchTable, request: Request) -> Response {
        match dispatch(table, request) {
            Action::Respond(response) => response,
            Action::Close => panic!("unexpected close"),
        }
    }

    #[rstest]
    fn commands_are_case_insensitive(table: DispatchTable) {
        let response = respond(&table, Request::new("SQUARE").with_args([json!(7)]));
        assert_eq!(response, Response::ok(json!(49)));
    }

    #[rstest]
    fn callable_errors_are_forwarded(table: DispatchTable) {
        let response = respond(&table, Request::new("fail"));
        assert_eq!(response.status, Status::ErrorForwarded);
        let error = RemoteError::from_payload(response.payload);
        assert_eq!(error, RemoteError::value_error("bad input"));
    }

    #[rstest]
    fn bad_arguments_are_forwarded_type_errors(table: DispatchTable) {
        let response = respond(&table, Request::new("square").with_args([json!("a")]));
        assert_eq!(response.status, Status::ErrorForwarded);
        assert!(RemoteError::from_payload(response.payload).is(RemoteError::TYPE_ERROR));
    }

    #[rstest]
    fn unknown_commands_are_local_errors(table: DispatchTable) {
        let response = respond(&table, Request::new("cube"));
        assert_eq!(response, Response::error("Command 'cube' is not registered."));
    }

    #[rstest]
    fn help_without_arguments_lists_the_table(table: DispatchTable) {
        let response = respond(&table, Request::new("help"));
        assert_eq!(
            response,
            Response::info("Available calls: [\"fail\", \"square\"]\nAvailable properties: []")
        );
    }

    #[rstest]
    fn help_for_a_command_shows_its_documentation(table: DispatchTable) {
        let response = respond(&table, Request::new("help").with_args([json!("square")]));
        assert_eq!(response, Response::info("square(x)\n\nReturns x squared."));
    }

    #[rstest]
    fn help_for_an_unknown_command_includes_the_listing(table: DispatchTable) {
        let response = respond(&table, Request::new("help").with_args([json!("cube")]));
        assert_eq!(response.status, Status::Info);
        let text = response.payload_text();
        assert!(text.starts_with("Command 'cube' is not registered.\nAvailable calls:"));
    }

    #[rstest]
    fn close_stops_the_loop(table: DispatchTable) {
        assert_eq!(dispatch(&table, Request::new("Close")), Action::Close);
    }
}
