//! Entry point for the `tether` binary.
//!
//! Delegates to [`tether_cli::run`] with the process arguments and standard
//! streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    tether_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
