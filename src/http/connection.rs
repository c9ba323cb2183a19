use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::net::TcpStream;

use crate::http::parser::{parse_http_request, ParseError, MAX_REQUEST_SIZE};
use crate::http::request::Request;

const READ_CHUNK: usize = 1024;

/// One accepted client socket and the bytes of its in-progress request.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
}

/// Framing progress of the single request a connection carries.
///
/// ```text
///   Accumulating ──(headers + body buffered)──▶ Complete ──(response written)──▶ Dispatched
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accumulating,
    Complete,
    Dispatched,
}

/// Result of one non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Bytes were appended to the request buffer.
    Data(usize),
    /// Orderly shutdown by the peer.
    Closed,
    /// Readiness was spurious; nothing to read yet.
    NotReady,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(MAX_REQUEST_SIZE),
            state: ConnectionState::Accumulating,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Registers interest in the socket becoming readable.
    pub fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.stream.poll_read_ready(cx)
    }

    /// Reads whatever is available without blocking, never past
    /// `MAX_REQUEST_SIZE` buffered bytes.
    pub fn receive(&mut self) -> io::Result<Received> {
        let room = MAX_REQUEST_SIZE - self.buffer.len();
        if room == 0 {
            return Ok(Received::Data(0));
        }

        let mut chunk = [0u8; READ_CHUNK];
        let limit = room.min(READ_CHUNK);
        match self.stream.try_read(&mut chunk[..limit]) {
            Ok(0) => Ok(Received::Closed),
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n]);
                Ok(Received::Data(n))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Received::NotReady),
            Err(e) => Err(e),
        }
    }

    /// Tries to frame a request from the buffered bytes.
    ///
    /// `Ok(None)` while more bytes are needed. A full buffer that still does
    /// not hold a complete request is `ParseError::TooLarge`. A connection
    /// carries one request: once framed, nothing more is framed.
    pub fn frame(&mut self) -> Result<Option<Request>, ParseError> {
        if self.state != ConnectionState::Accumulating {
            return Ok(None);
        }

        match parse_http_request(&self.buffer) {
            Ok((request, _consumed)) => {
                self.state = ConnectionState::Complete;
                Ok(Some(request))
            }
            Err(ParseError::Incomplete) if self.buffer.len() >= MAX_REQUEST_SIZE => {
                Err(ParseError::TooLarge)
            }
            Err(ParseError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn mark_dispatched(&mut self) {
        self.state = ConnectionState::Dispatched;
    }
}
