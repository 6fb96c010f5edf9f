use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::DEFAULT_PORT;

/// IPv4 wildcard address.
pub const ALL_INTERFACES: &str = "0.0.0.0";

/// IPv4 loopback address.
pub const LOOPBACK: &str = "127.0.0.1";

/// Normalises a host alias.
///
/// `None`, the empty string and `"*"` select every interface; `"localhost"`
/// selects the loopback address. Any other value is returned trimmed.
#[must_use]
pub fn parse_host(host: Option<&str>) -> String {
    match host.map(str::trim) {
        None | Some("" | "*") => ALL_INTERFACES.to_owned(),
        Some(value) if value.eq_ignore_ascii_case("localhost") => LOOPBACK.to_owned(),
        Some(value) => value.to_owned(),
    }
}

/// TCP address a server listens on or a client dials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Builds an endpoint, normalising host aliases.
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: parse_host(Some(host)),
            port,
        }
    }

    /// Endpoint bound to every interface.
    #[must_use]
    pub fn all_interfaces(port: u16) -> Self {
        Self::new("*", port)
    }

    /// Endpoint on the loopback interface.
    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self::new("localhost", port)
    }

    /// Normalised host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns a copy of the endpoint using another port.
    #[must_use]
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            host: self.host.clone(),
            port,
        }
    }

    /// Whether the endpoint is the IPv4 wildcard.
    #[must_use]
    pub fn is_all_interfaces(&self) -> bool {
        self.host == ALL_INTERFACES
    }

    /// Whether the endpoint is the IPv4 loopback.
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        self.host == LOOPBACK
    }

    /// Resolves the endpoint, preferring IPv4 addresses.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Resolve`] when name resolution fails and
    /// [`EndpointError::ResolveEmpty`] when it yields no addresses.
    pub fn resolve(&self) -> Result<SocketAddr, EndpointError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| EndpointError::Resolve {
                endpoint: self.to_string(),
                source,
            })?
            .collect();
        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| EndpointError::ResolveEmpty {
                endpoint: self.to_string(),
            })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    /// Parses `host`, `host:port` or `tcp://host:port`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.contains("://") {
            let url = Url::parse(input)?;
            if url.scheme() != "tcp" {
                return Err(EndpointError::UnsupportedScheme(url.scheme().to_owned()));
            }
            let host = url
                .host_str()
                .ok_or_else(|| EndpointError::MissingHost(input.to_owned()))?;
            return Ok(Self::new(host, url.port().unwrap_or(DEFAULT_PORT)));
        }

        match input.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .trim()
                    .parse()
                    .map_err(|_| EndpointError::InvalidPort(input.to_owned()))?;
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(input, DEFAULT_PORT)),
        }
    }
}

/// Errors encountered while parsing or resolving an [`Endpoint`].
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Scheme was not recognised.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// Port was not a valid number.
    #[error("invalid port in '{0}'")]
    InvalidPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Name resolution failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Name resolution produced nothing usable.
    #[error("no addresses resolved for {endpoint}")]
    ResolveEmpty { endpoint: String },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, ALL_INTERFACES)]
    #[case(Some("*"), ALL_INTERFACES)]
    #[case(Some(""), ALL_INTERFACES)]
    #[case(Some("localhost"), LOOPBACK)]
    #[case(Some("10.0.0.7"), "10.0.0.7")]
    fn host_aliases_are_normalised(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(parse_host(input), expected);
    }

    #[rstest]
    #[case("localhost:9000", LOOPBACK, 9000)]
    #[case("tcp://192.168.1.4:3000", "192.168.1.4", 3000)]
    #[case("*:1234", ALL_INTERFACES, 1234)]
    #[case("10.1.1.1", "10.1.1.1", DEFAULT_PORT)]
    fn parses_endpoint_forms(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let endpoint: Endpoint = input.parse().expect("endpoint should parse");
        assert_eq!(endpoint.host(), host);
        assert_eq!(endpoint.port(), port);
    }

    #[test]
    fn rejects_non_tcp_scheme() {
        let error = "unix:///tmp/tether.sock"
            .parse::<Endpoint>()
            .expect_err("unix scheme should be rejected");
        assert!(matches!(error, EndpointError::UnsupportedScheme(_)));
    }

    #[test]
    fn rejects_bad_port() {
        let error = "localhost:http"
            .parse::<Endpoint>()
            .expect_err("port must be numeric");
        assert!(matches!(error, EndpointError::InvalidPort(_)));
    }

    #[test]
    fn display_round_trips_host_and_port() {
        assert_eq!(Endpoint::localhost(4440).to_string(), "127.0.0.1:4440");
    }

    #[test]
    fn resolves_loopback_to_ipv4() {
        let addr = Endpoint::localhost(4440).resolve().expect("resolve loopback");
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 4440);
    }
}
