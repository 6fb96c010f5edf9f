//! Command-line flags that populate a [`Config`].

use std::time::Duration;

use clap::Args;

use crate::defaults::{DEFAULT_LOG_FILTER, DEFAULT_PORT};
use crate::{Backoff, Config, Endpoint, LogFormat, LoggingConfig, ReconnectPolicy, Role, Secret};

/// Where to listen or connect, and the secret to present.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// IPv4 address; `*` selects every interface and `localhost` the loopback.
    #[arg(long, env = "TETHER_ADDRESS")]
    pub address: Option<String>,
    /// TCP port.
    #[arg(long, env = "TETHER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Shared secret compared when the connection is established.
    #[arg(long, env = "TETHER_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

/// Diagnostic output flags.
#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Log filter expression, for example `info` or `tether=debug`.
    #[arg(long, env = "TETHER_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
    /// Log rendering format (`compact` or `json`).
    #[arg(long, env = "TETHER_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Client reconnection flags.
#[derive(Debug, Clone, Args)]
pub struct ReconnectArgs {
    /// Pause between reconnection attempts, in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    pub retry_delay_ms: u64,
    /// Growth applied to the pause (`fixed` or `exponential`).
    #[arg(long, default_value_t = Backoff::Fixed)]
    pub backoff: Backoff,
    /// Ceiling for exponential backoff, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub max_retry_delay_ms: u64,
    /// Give up after this many failed attempts instead of retrying forever.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// All configuration flags understood by the binaries.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Connection flags.
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Logging flags.
    #[command(flatten)]
    pub logging: LoggingArgs,
    /// Reconnection flags.
    #[command(flatten)]
    pub reconnect: ReconnectArgs,
}

impl ReconnectArgs {
    /// Builds the policy described by the flags.
    #[must_use]
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            backoff: self.backoff,
            max_delay: Duration::from_millis(self.max_retry_delay_ms),
            max_attempts: self.max_attempts,
        }
    }
}

impl ConfigArgs {
    /// Resolves the flags into a configuration for `role`.
    #[must_use]
    pub fn resolve(&self, role: Role) -> Config {
        let host = self
            .connection
            .address
            .as_deref()
            .unwrap_or_else(|| role.default_host());
        Config {
            endpoint: Endpoint::new(host, self.connection.port),
            secret: self.connection.secret.clone().map(Secret::from),
            logging: LoggingConfig {
                filter: self.logging.log_filter.clone(),
                format: self.logging.log_format,
            },
            reconnect: self.reconnect.policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{ALL_INTERFACES, LOOPBACK};

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigArgs {
        let mut argv = vec!["tether"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv)
            .expect("arguments should parse")
            .config
    }

    #[test]
    fn defaults_depend_on_role() {
        let args = parse(&["--port", "9000"]);
        assert_eq!(args.resolve(Role::Server).endpoint.host(), ALL_INTERFACES);
        assert_eq!(args.resolve(Role::Client).endpoint.host(), LOOPBACK);
        assert_eq!(args.resolve(Role::Client).endpoint.port(), 9000);
    }

    #[test]
    fn reconnect_flags_build_policy() {
        let args = parse(&[
            "--backoff",
            "exponential",
            "--retry-delay-ms",
            "10",
            "--max-attempts",
            "3",
        ]);
        let policy = args.resolve(Role::Client).reconnect;
        assert_eq!(policy.backoff, Backoff::Exponential);
        assert_eq!(policy.delay, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, Some(3));
    }

    #[test]
    fn secret_flag_is_carried() {
        let args = parse(&["--secret", "abc", "--log-format", "json"]);
        let config = args.resolve(Role::Server);
        assert_eq!(config.secret, Some(Secret::from("abc")));
        assert_eq!(config.log_format(), LogFormat::Json);
    }
}
