//! Shared-secret handshake run on every new connection.

use tether_config::Secret;
use tracing::debug;

use super::{FramedStream, HandshakeError, TRANSPORT_TARGET};
use crate::protocol::{Handshake, digest, generate_nonce, verify_digest};

/// Server side: greets the client and checks its answer.
///
/// On a mismatch the client is told it was rejected before the error is
/// returned, so it can report an authentication failure instead of a reset.
pub(crate) fn challenge_peer(
    stream: &mut FramedStream,
    secret: Option<&Secret>,
) -> Result<(), HandshakeError> {
    let Some(secret) = secret else {
        stream.send(&Handshake::Open)?;
        return Ok(());
    };

    let nonce = generate_nonce();
    stream.send(&Handshake::Challenge {
        nonce: nonce.clone(),
    })?;
    match stream.recv::<Handshake>()? {
        Handshake::Answer { digest } if verify_digest(&nonce, secret, &digest) => {
            stream.send(&Handshake::Accepted)?;
            Ok(())
        }
        Handshake::Answer { .. } => {
            debug!(target: TRANSPORT_TARGET, "rejecting client with wrong secret");
            stream.send(&Handshake::Rejected)?;
            Err(HandshakeError::Rejected)
        }
        other => Err(HandshakeError::Unexpected(format!("{other:?}"))),
    }
}

/// Client side: answers the server's greeting.
pub(crate) fn answer_challenge(
    stream: &mut FramedStream,
    secret: Option<&Secret>,
) -> Result<(), HandshakeError> {
    match (stream.recv::<Handshake>()?, secret) {
        (Handshake::Open, None) => Ok(()),
        (Handshake::Open, Some(_)) => Err(HandshakeError::SecretUnexpected),
        (Handshake::Challenge { .. }, None) => Err(HandshakeError::SecretRequired),
        (Handshake::Challenge { nonce }, Some(secret)) => {
            stream.send(&Handshake::Answer {
                digest: digest(&nonce, secret),
            })?;
            match stream.recv::<Handshake>()? {
                Handshake::Accepted => Ok(()),
                Handshake::Rejected => Err(HandshakeError::Rejected),
                other => Err(HandshakeError::Unexpected(format!("{other:?}"))),
            }
        }
        (other, _) => Err(HandshakeError::Unexpected(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use rstest::rstest;

    use super::*;

    fn handshake(
        server_secret: Option<&'static str>,
        client_secret: Option<&'static str>,
    ) -> (Result<(), HandshakeError>, Result<(), HandshakeError>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut stream = FramedStream::new(stream);
            challenge_peer(&mut stream, server_secret.map(Secret::from).as_ref())
        });
        let mut client = FramedStream::new(TcpStream::connect(addr).expect("connect"));
        let client_result = answer_challenge(&mut client, client_secret.map(Secret::from).as_ref());
        drop(client);
        let server_result = server.join().expect("join server");
        (server_result, client_result)
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("abc"), Some("abc"))]
    fn matching_configurations_connect(
        #[case] server: Option<&'static str>,
        #[case] client: Option<&'static str>,
    ) {
        let (server_result, client_result) = handshake(server, client);
        assert!(server_result.is_ok());
        assert!(client_result.is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected_on_both_ends() {
        let (server_result, client_result) = handshake(Some("abc"), Some("xyz"));
        assert!(matches!(server_result, Err(HandshakeError::Rejected)));
        assert!(matches!(client_result, Err(HandshakeError::Rejected)));
    }

    #[test]
    fn missing_client_secret_is_reported() {
        let (_, client_result) = handshake(Some("abc"), None);
        assert!(matches!(client_result, Err(HandshakeError::SecretRequired)));
    }

    #[test]
    fn unexpected_client_secret_is_reported() {
        let (_, client_result) = handshake(None, Some("abc"));
        assert!(matches!(client_result, Err(HandshakeError::SecretUnexpected)));
    }
}
