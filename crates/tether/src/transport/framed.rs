//! Newline-delimited JSON framing over a TCP stream.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::TransportError;

/// Largest frame accepted from a peer, in bytes.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

const CHUNK_BYTES: usize = 8 * 1024;

/// A connected stream exchanging one JSON value per line.
///
/// Bytes read past the end of a frame are kept for the next call, so several
/// frames written back to back are delivered one at a time and in order.
#[derive(Debug)]
pub struct FramedStream {
    stream: TcpStream,
    buffer: Vec<u8>,
    peer: Option<SocketAddr>,
}

impl FramedStream {
    /// Wraps a connected stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        Self {
            stream,
            buffer: Vec::new(),
            peer,
        }
    }

    /// Address of the remote end, when known.
    #[must_use]
    pub const fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Serialises and writes one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] when the value cannot be serialised
    /// and a classified socket error when writing fails.
    pub fn send<T: Serialize>(&mut self, frame: &T) -> Result<(), TransportError> {
        let mut bytes = serde_json::to_vec(frame).map_err(TransportError::Encode)?;
        bytes.push(b'\n');
        self.stream
            .write_all(&bytes)
            .and_then(|()| self.stream.flush())
            .map_err(TransportError::from_io)
    }

    /// Reads and decodes one frame, blocking until it is complete.
    ///
    /// A frame that is not valid for `T` is consumed before
    /// [`TransportError::Decode`] is returned, so the stream stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the peer has closed the
    /// connection, [`TransportError::Decode`] for malformed frames and a
    /// classified socket error otherwise.
    pub fn recv<T: DeserializeOwned>(&mut self) -> Result<T, TransportError> {
        let line = self.recv_line()?;
        serde_json::from_slice(&line).map_err(TransportError::Decode)
    }

    /// Reads the next raw frame without its trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] at end of stream (a trailing partial
    /// frame included) and [`TransportError::FrameTooLarge`] when the frame
    /// grows past [`MAX_FRAME_BYTES`].
    pub fn recv_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut scanned = 0;
        loop {
            if let Some(offset) = self.buffer.get(scanned..).and_then(find_newline) {
                let end = scanned + offset;
                let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                line.pop();
                return Ok(line);
            }
            scanned = self.buffer.len();
            enforce_limit(scanned)?;

            let mut chunk = [0_u8; CHUNK_BYTES];
            let read = read_with_retry(&mut self.stream, &mut chunk)?;
            if read == 0 {
                return Err(TransportError::Closed);
            }
            self.buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
        }
    }

    /// Reports whether a frame (or end of stream) can be read without
    /// blocking.
    ///
    /// # Errors
    ///
    /// Returns a classified socket error when the probe fails.
    pub fn poll(&mut self) -> Result<bool, TransportError> {
        if find_newline(&self.buffer).is_some() {
            return Ok(true);
        }
        self.stream
            .set_nonblocking(true)
            .map_err(TransportError::Io)?;
        let mut probe = [0_u8; 1];
        let outcome = self.stream.peek(&mut probe);
        self.stream
            .set_nonblocking(false)
            .map_err(TransportError::Io)?;
        match outcome {
            Ok(_) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(error) => Err(TransportError::from_io(error)),
        }
    }

    /// Shuts down both directions, ignoring sockets that are already gone.
    pub fn shutdown(&self) {
        if let Err(error) = self.stream.shutdown(Shutdown::Both) {
            tracing::trace!(
                target: super::TRANSPORT_TARGET,
                %error,
                "shutdown on closed stream"
            );
        }
    }
}

fn find_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|byte| *byte == b'\n')
}

fn read_with_retry(stream: &mut TcpStream, buf: &mut [u8]) -> Result<usize, TransportError> {
    loop {
        match stream.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(TransportError::from_io(error)),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), TransportError> {
    if size > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
        });
    }
    Ok(())
}
