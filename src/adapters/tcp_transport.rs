//! TCP transport adapter for the relay link.
//!
//! Implements [`Transport`] as a single-client, non-blocking TCP server.
//! The relay server connects in and exchanges newline-delimited JSON.
//! ESP-IDF exposes lwIP through `std::net`, so the same code runs on the
//! device and on the host.
//!
//! ## Connection model
//!
//! 1. `new()` binds a listener on the given port (non-blocking mode).
//! 2. `accept()` polls for an incoming connection; a new client replaces
//!    nothing, it is refused until the current one disconnects.
//! 3. Reads are non-blocking: `read()` returns `Ok(0)` when no data
//!    is available rather than blocking the caller.
//! 4. Writes are queued and drained as far as the socket accepts, so a
//!    frame is never cut short.  What is left goes out on the next
//!    `write()` or `flush()`.  A client that lets the queue pass
//!    [`TX_CAP`] bytes is dropped.
//! 5. EOF or a socket error drops the client and returns to `Listening`.

use core::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{info, warn};

use crate::relay::transport::Transport;

/// Default listen port for the relay link.
pub const DEFAULT_PORT: u16 = 4210;

/// Outbound bytes held for a slow client before it is dropped.
pub const TX_CAP: usize = 4096;

/// Errors originating from the TCP transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpTransportError {
    /// Socket I/O failure.
    Io,
    /// Operation requires a connected client but none is present.
    NotConnected,
}

impl fmt::Display for TcpTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "TCP/socket I/O error"),
            Self::NotConnected => write!(f, "no client connected"),
        }
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Listening,
    Connected,
}

pub struct TcpTransport {
    listener: TcpListener,
    stream: Option<TcpStream>,
    tx: Vec<u8>,
}

impl TcpTransport {
    /// Bind to `0.0.0.0:<port>`.  Port `0` lets the OS pick.
    pub fn new(port: u16) -> Result<Self, TcpTransportError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).map_err(|_| TcpTransportError::Io)?;
        listener
            .set_nonblocking(true)
            .map_err(|_| TcpTransportError::Io)?;
        info!("relay(tcp): listening on port {}", port);
        Ok(Self {
            listener,
            stream: None,
            tx: Vec::new(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Listening
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpTransportError> {
        self.listener
            .local_addr()
            .map_err(|_| TcpTransportError::Io)
    }

    /// Poll for an incoming client (non-blocking).  Returns `true` if a
    /// new client was accepted.
    pub fn accept(&mut self) -> bool {
        if self.stream.is_some() {
            return false;
        }
        match self.listener.accept() {
            Ok((stream, addr)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("relay(tcp): failed to set non-blocking on client socket");
                    return false;
                }
                info!("relay(tcp): client connected from {}", addr);
                self.stream = Some(stream);
                true
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(e) => {
                warn!("relay(tcp): accept error: {}", e);
                false
            }
        }
    }

    /// Drop the current client and return to `Listening`.
    pub fn disconnect(&mut self) {
        self.tx.clear();
        if self.stream.take().is_some() {
            info!("relay(tcp): client disconnected");
        }
    }

    /// Bytes accepted by `write()` but not yet taken by the socket.
    pub fn pending_tx(&self) -> usize {
        self.tx.len()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TcpTransportError> {
        self.stream.as_mut().ok_or(TcpTransportError::NotConnected)
    }

    fn pump_tx(&mut self) -> Result<(), TcpTransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TcpTransportError::NotConnected);
        };
        let res = drain(&mut self.tx, &mut *stream).and_then(|()| match stream.flush() {
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            other => other,
        });
        if let Err(e) = res {
            warn!("relay(tcp): write failed: {}", e);
            self.disconnect();
            return Err(TcpTransportError::Io);
        }
        Ok(())
    }
}

/// Write out as much of `tx` as `w` takes without blocking.
fn drain(tx: &mut Vec<u8>, w: &mut impl Write) -> std::io::Result<()> {
    while !tx.is_empty() {
        match w.write(tx) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => {
                tx.drain(..n);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl Transport for TcpTransport {
    type Error = TcpTransportError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TcpTransportError> {
        match self.stream()?.read(buf) {
            Ok(0) => {
                self.disconnect();
                Err(TcpTransportError::NotConnected)
            }
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(_) => {
                self.disconnect();
                Err(TcpTransportError::Io)
            }
        }
    }

    /// Queue `data` whole.  Either every byte is accepted or the client
    /// is dropped.
    fn write(&mut self, data: &[u8]) -> Result<usize, TcpTransportError> {
        self.stream()?;
        if self.tx.len() + data.len() > TX_CAP {
            warn!(
                "relay(tcp): client not draining ({} bytes queued), dropping it",
                self.tx.len()
            );
            self.disconnect();
            return Err(TcpTransportError::Io);
        }
        self.tx.extend_from_slice(data);
        self.pump_tx()?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), TcpTransportError> {
        self.pump_tx()
    }
}
