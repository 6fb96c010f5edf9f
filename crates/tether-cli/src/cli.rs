//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use tether_config::ConfigArgs;

/// Serve or call tether RPC endpoints.
#[derive(Parser, Debug)]
#[command(name = "tether", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Connection, logging and reconnection flags.
    #[command(flatten)]
    pub(crate) config: ConfigArgs,
    /// Action to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Actions understood by the binary.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Hosts the demonstration functions and accumulator until a client sends
    /// `close`.
    Serve {
        /// Prefix applied to the accumulator's commands.
        #[arg(long)]
        prefix: Option<String>,
        /// Suppresses the start-up banner.
        #[arg(long)]
        quiet: bool,
    },
    /// Calls a command on a running server and prints its result.
    Call {
        /// Command name.
        #[arg(value_name = "COMMAND")]
        command: String,
        /// Positional arguments, parsed as JSON and otherwise passed as text.
        #[arg(value_name = "ARG", num_args = 0.., allow_negative_numbers = true)]
        args: Vec<String>,
        /// Keyword argument as `name=value`; may be repeated.
        #[arg(long = "kw", value_name = "NAME=VALUE")]
        kwargs: Vec<String>,
    },
    /// Prints the server's command listing or one command's documentation.
    Help {
        /// Command to document.
        #[arg(value_name = "COMMAND")]
        command: Option<String>,
    },
    /// Asks the server to stop listening.
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse_call(args: &[&str]) -> (Vec<String>, Vec<String>) {
        let cli = Cli::try_parse_from(["tether", "call"].iter().chain(args))
            .expect("arguments should parse");
        match cli.command {
            CliCommand::Call { args, kwargs, .. } => (args, kwargs),
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[rstest]
    #[case(&["sum", "2", "--kw", "b=5"], &["2"], &["b=5"])]
    #[case(&["sum", "--kw", "b=5", "2"], &["2"], &["b=5"])]
    #[case(&["sum", "-3", "4"], &["-3", "4"], &[])]
    #[case(&["echo", "2", "--kw", "a=1", "--kw", "b=2"], &["2"], &["a=1", "b=2"])]
    fn keywords_are_separated_from_positionals(
        #[case] input: &[&str],
        #[case] positional: &[&str],
        #[case] keywords: &[&str],
    ) {
        let (args, kwargs) = parse_call(input);
        assert_eq!(args, positional);
        assert_eq!(kwargs, keywords);
    }
}
