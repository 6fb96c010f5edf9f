//! Client-side connection establishment.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use tether_config::{Endpoint, EndpointError};

use super::FramedStream;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a failed dial.
#[derive(Debug)]
pub(crate) enum DialError {
    /// The endpoint could not be resolved.
    Resolve(EndpointError),
    /// The server is not reachable right now; retrying may succeed.
    Unavailable(io::Error),
    /// Any other socket failure.
    Io(io::Error),
}

/// Dials the endpoint.
pub(crate) fn connect(endpoint: &Endpoint) -> Result<FramedStream, DialError> {
    let address = endpoint.resolve().map_err(DialError::Resolve)?;
    TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
        .map(FramedStream::new)
        .map_err(|error| {
            if is_server_unavailable(&error) {
                DialError::Unavailable(error)
            } else {
                DialError::Io(error)
            }
        })
}

/// Whether a dial error means nothing is listening yet.
fn is_server_unavailable(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotFound
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn refused_connections_are_retryable() {
        let port = {
            let probe = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe");
            probe.local_addr().expect("addr").port()
        };
        let error = connect(&Endpoint::localhost(port)).expect_err("nothing listens");
        assert!(matches!(error, DialError::Unavailable(_)));
    }
}
