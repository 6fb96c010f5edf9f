//! Listening socket for the server's accept loop.

use std::io;
use std::net::{SocketAddr, TcpListener};

use tether_config::Endpoint;

use super::{FramedStream, ListenerError};

/// A bound TCP listener handing out framed connections.
#[derive(Debug)]
pub(crate) struct Listener {
    inner: TcpListener,
}

impl Listener {
    pub(crate) fn bind(endpoint: &Endpoint) -> Result<Self, ListenerError> {
        let addr = endpoint.resolve()?;
        let inner =
            TcpListener::bind(addr).map_err(|source| ListenerError::Bind { addr, source })?;
        Ok(Self { inner })
    }

    pub(crate) fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        self.inner.local_addr().map_err(ListenerError::LocalAddr)
    }

    /// Blocks until a client connects.
    pub(crate) fn accept(&self) -> Result<(FramedStream, SocketAddr), ListenerError> {
        loop {
            match self.inner.accept() {
                Ok((stream, peer)) => return Ok((FramedStream::new(stream), peer)),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(ListenerError::Accept(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;

    use super::*;

    #[test]
    fn binds_ephemeral_port_and_accepts() {
        let listener = Listener::bind(&Endpoint::localhost(0)).expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        assert_ne!(addr.port(), 0);

        let _client = TcpStream::connect(addr).expect("connect");
        let (stream, _) = listener.accept().expect("accept");
        assert!(stream.peer_addr().is_some());
    }

    #[test]
    fn rejects_port_in_use() {
        let first = Listener::bind(&Endpoint::localhost(0)).expect("bind first");
        let port = first.local_addr().expect("local addr").port();
        let error = Listener::bind(&Endpoint::localhost(port)).expect_err("port is taken");
        assert!(matches!(error, ListenerError::Bind { .. }));
    }
}
