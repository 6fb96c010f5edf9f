//! Integration tests for the `tether` binary.
//!
//! Starts a real `tether serve` process and drives it with the client
//! subcommands.

use std::net::TcpListener;
use std::process::{Child, Command, Stdio};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;

/// Kills the server process if a test fails before closing it.
struct ServerProcess {
    child: Child,
    port: u16,
}

impl ServerProcess {
    fn start(secret: &str) -> anyhow::Result<Self> {
        let port = free_port()?;
        let child = Command::new(env!("CARGO_BIN_EXE_tether"))
            .args(["--address", "127.0.0.1", "--port", &port.to_string()])
            .args(["--secret", secret, "--log-filter", "warn", "serve", "--quiet"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Self { child, port })
    }

    fn client(&self, secret: &str) -> assert_cmd::Command {
        let mut command = cargo_bin_cmd!("tether");
        command.args(["--address", "127.0.0.1", "--port", &self.port.to_string()]);
        command.args(["--secret", secret, "--log-filter", "off", "--retry-delay-ms", "50"]);
        command
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> anyhow::Result<u16> {
    let probe = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(probe.local_addr()?.port())
}

#[test]
fn help_flag_lists_subcommands() {
    let mut command = cargo_bin_cmd!("tether");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("serve").and(contains("call")).and(contains("close")));
}

#[test]
fn bounded_retries_report_an_unreachable_server() -> anyhow::Result<()> {
    let port = free_port()?;
    let mut command = cargo_bin_cmd!("tether");
    command.args(["--address", "127.0.0.1", "--port", &port.to_string()]);
    command.args(["--max-attempts", "2", "--retry-delay-ms", "10", "--log-filter", "off"]);
    command.args(["call", "square", "7"]);
    command
        .assert()
        .failure()
        .stderr(contains("unreachable after 2 attempts"));
    Ok(())
}

#[test]
fn serve_and_call_round_trip() -> anyhow::Result<()> {
    let mut server = ServerProcess::start("abc")?;

    server
        .client("abc")
        .args(["call", "square", "7"])
        .assert()
        .success()
        .stdout("49\n");
    server
        .client("abc")
        .args(["call", "square", "a"])
        .assert()
        .failure()
        .stderr(contains("TypeError"));
    server
        .client("abc")
        .args(["call", "cube", "3"])
        .assert()
        .failure()
        .stderr(contains("Command 'cube' is not registered."));
    server
        .client("abc")
        .args(["call", "sum", "2", "--kw", "b=5"])
        .assert()
        .success()
        .stdout("7\n");
    server
        .client("abc")
        .args(["call", "set_total", "5"])
        .assert()
        .success();
    server
        .client("abc")
        .args(["call", "get_total"])
        .assert()
        .success()
        .stdout("5\n");
    server
        .client("abc")
        .args(["help", "square"])
        .assert()
        .success()
        .stdout(contains("square(x)\n\nReturns x squared."));
    server
        .client("xyz")
        .args(["call", "square", "7"])
        .assert()
        .failure()
        .stderr(contains("authentication failed"));

    server.client("abc").arg("close").assert().success();
    let status = server.child.wait()?;
    assert!(status.success());
    Ok(())
}

#[test]
fn proxied_members_are_checked_before_sending() -> anyhow::Result<()> {
    let port = free_port()?;
    let mut command = cargo_bin_cmd!("tether");
    command.args(["--address", "127.0.0.1", "--port", &port.to_string()]);
    command.args(["--max-attempts", "1", "--log-filter", "off"]);
    command.args(["call", "add", "1", "2"]);
    command
        .assert()
        .failure()
        .stderr(contains("add() takes 1 positional arguments but 2 were given"));
    Ok(())
}
