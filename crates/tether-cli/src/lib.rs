//! Command-line runtime for the tether RPC layer.
//!
//! `tether serve` hosts a small demonstration surface: a few free functions
//! and an accumulator object exposed through its methods and properties.
//! `tether call`, `tether help` and `tether close` talk to any running server.
//! Output streams are injected so tests can capture them.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};
use tether::{Client, ClientProxy, RunOptions, Server, telemetry};
use tether_config::{Config, Role};

mod cli;
mod demo;
mod errors;

use cli::{Cli, CliCommand};
use errors::AppError;

const USAGE_EXIT_CODE: u8 = 2;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    match Cli::try_parse_from(args)
        .map_err(AppError::CliUsage)
        .and_then(|cli| execute(cli, &mut io))
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(io.stdout, "{}", error.render());
            ExitCode::SUCCESS
        }
        Err(AppError::CliUsage(error)) => {
            let _ = write!(io.stderr, "{}", error.render());
            ExitCode::from(USAGE_EXIT_CODE)
        }
        Err(error) => {
            let _ = writeln!(io.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write, E: Write>(cli: Cli, io: &mut IoStreams<'_, W, E>) -> Result<(), AppError> {
    let role = match cli.command {
        CliCommand::Serve { .. } => Role::Server,
        _ => Role::Client,
    };
    let config = cli.config.resolve(role);
    telemetry::initialise(&config.logging)?;

    match cli.command {
        CliCommand::Serve { prefix, quiet } => serve(&config, prefix.as_deref(), quiet, io),
        CliCommand::Call {
            command,
            args,
            kwargs,
        } => {
            let mut proxy = ClientProxy::new(Client::new(&config)).of::<demo::Accumulator>(None);
            let args = args.iter().map(|arg| parse_value(arg)).collect();
            let value = proxy.invoke(&command, args, parse_keywords(&kwargs)?)?;
            write_value(io.stdout, &value)
        }
        CliCommand::Help { command } => {
            let text = Client::new(&config).help(command.as_deref())?;
            writeln!(io.stdout, "{text}").map_err(AppError::Output)
        }
        CliCommand::Close => {
            let mut client = Client::new(&config);
            if !client.connect()? {
                return Err(AppError::Unavailable(config.endpoint.to_string()));
            }
            client.close(true);
            writeln!(io.stdout, "close sent to {}", config.endpoint).map_err(AppError::Output)
        }
    }
}

fn serve<W: Write, E: Write>(
    config: &Config,
    prefix: Option<&str>,
    quiet: bool,
    io: &mut IoStreams<'_, W, E>,
) -> Result<(), AppError> {
    let mut server = Server::new(config);
    demo::register(&mut server, prefix)?;
    server.listen()?;
    if !quiet {
        writeln!(io.stderr, "{}", server.help_server()).map_err(AppError::Output)?;
        io.stderr.flush().map_err(AppError::Output)?;
    }
    server.run(RunOptions::default())?;
    writeln!(io.stdout, "{server} stopped").map_err(AppError::Output)
}

/// Parses an argument as JSON, keeping it as text when it is not valid JSON.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn parse_keywords(pairs: &[String]) -> Result<Map<String, Value>, AppError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.to_owned(), parse_value(value)))
                .ok_or_else(|| AppError::MalformedKeyword(pair.clone()))
        })
        .collect()
}

fn write_value(stdout: &mut impl Write, value: &Value) -> Result<(), AppError> {
    match value {
        Value::String(text) => writeln!(stdout, "{text}"),
        other => writeln!(stdout, "{other}"),
    }
    .map_err(AppError::Output)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("7", json!(7))]
    #[case("[1, 2]", json!([1, 2]))]
    #[case("\"quoted\"", json!("quoted"))]
    #[case("plain", json!("plain"))]
    fn arguments_parse_as_json_or_text(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(parse_value(raw), expected);
    }

    #[test]
    fn keywords_split_on_the_first_equals() {
        let parsed = parse_keywords(&["b=3".to_owned(), "label=a=b".to_owned()]).expect("parse");
        assert_eq!(parsed.get("b"), Some(&json!(3)));
        assert_eq!(parsed.get("label"), Some(&json!("a=b")));
    }

    #[test]
    fn keywords_need_a_name() {
        let error = parse_keywords(&["=3".to_owned()]).expect_err("no name");
        assert!(matches!(error, AppError::MalformedKeyword(_)));
    }

    #[test]
    fn help_flag_prints_to_stdout() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            ["tether", "--help"].map(OsString::from),
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(String::from_utf8_lossy(&stdout).contains("serve"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            ["tether", "frobnicate"].map(OsString::from),
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::from(USAGE_EXIT_CODE));
        assert!(!stderr.is_empty());
    }
}
