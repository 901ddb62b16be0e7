//! TCP transport adapter.
//!
//! Implements [`PeerTransport`] as a non-blocking TCP server with a fixed
//! number of client slots.
//!
//! ## Connection model
//!
//! 1. `bind()` opens a listener on the given port (non-blocking mode).
//! 2. `accept()` drains pending connections into free slots; a client
//!    arriving while every slot is busy is refused by dropping it.
//! 3. Each slot owns a [`PeerSocket`]: the stream plus a small receive
//!    buffer and read cursor. Reads never block. `available()` returns the
//!    buffered byte count, refilling from the socket once the buffer is
//!    drained.
//! 4. EOF or a socket error frees the slot. The router then sees the peer
//!    as disconnected.
//! 5. A write that hits a full send buffer is retried up to
//!    [`WRITE_RETRIES`] times, 1 ms apart. If the buffer is still full the
//!    write reports 0 bytes and the reply is dropped.

use core::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{MAX_LINE_LEN, MAX_PEERS};
use crate::rpc::session::PeerId;
use crate::rpc::transport::PeerTransport;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Per-peer receive buffer size (bytes).
pub const RX_BUF_LEN: usize = MAX_LINE_LEN;

/// Retries of a write that found the send buffer full.
pub const WRITE_RETRIES: u32 = 50;

const WRITE_RETRY_DELAY: Duration = Duration::from_millis(1);

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

/// Errors originating from the TCP transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpTransportError {
    /// Bind, accept or socket I/O failure.
    Io,
    /// The slot has no connected client.
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

impl core::error::Error for TcpTransportError {}

// ───────────────────────────────────────────────────────────────
// PeerSocket
// ───────────────────────────────────────────────────────────────

/// One connected client: stream, receive buffer, read cursor.
pub struct PeerSocket {
    stream: TcpStream,
    addr: SocketAddr,
    rx: Vec<u8, RX_BUF_LEN>,
    cursor: usize,
}

/// Result of topping up a peer's receive buffer.
enum Fill {
    Ready(usize),
    Closed,
}

impl PeerSocket {
    fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self {
            stream,
            addr,
            rx: Vec::new(),
            cursor: 0,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn buffered(&self) -> usize {
        self.rx.len() - self.cursor
    }

    /// Refill from the socket once the buffer is drained.
    fn fill(&mut self) -> Fill {
        if self.buffered() > 0 {
            return Fill::Ready(self.buffered());
        }
        self.rx.clear();
        self.cursor = 0;

        let mut chunk = [0u8; RX_BUF_LEN];
        match self.stream.read(&mut chunk) {
            Ok(0) => Fill::Closed,
            Ok(n) => {
                // n <= RX_BUF_LEN, so this cannot fail.
                let _ = self.rx.extend_from_slice(&chunk[..n]);
                Fill::Ready(n)
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Fill::Ready(0),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => Fill::Ready(0),
            Err(e) => {
                warn!("TCP: read from {} failed: {}", self.addr, e);
                Fill::Closed
            }
        }
    }

    fn take(&mut self) -> Option<u8> {
        let byte = self.rx.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }
}

// ───────────────────────────────────────────────────────────────
// TcpTransport
// ───────────────────────────────────────────────────────────────

/// Multi-client TCP server with [`MAX_PEERS`] slots.
pub struct TcpTransport {
    listener: TcpListener,
    peers: [Option<PeerSocket>; MAX_PEERS],
}

impl TcpTransport {
    /// Bind to `0.0.0.0:<port>`.
    ///
    /// Pass port `0` to let the OS pick a free port (use
    /// [`local_addr()`](Self::local_addr) to discover it).
    pub fn bind(port: u16) -> Result<Self, TcpTransportError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).map_err(|_| TcpTransportError::Io)?;
        listener
            .set_nonblocking(true)
            .map_err(|_| TcpTransportError::Io)?;

        info!("TCP: listening on port {}", port);

        Ok(Self {
            listener,
            peers: core::array::from_fn(|_| None),
        })
    }

    /// The actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpTransportError> {
        self.listener
            .local_addr()
            .map_err(|_| TcpTransportError::Io)
    }

    /// Number of occupied slots.
    pub fn connected(&self) -> usize {
        self.peers.iter().filter(|p| p.is_some()).count()
    }

    pub fn peer(&self, peer: PeerId) -> Option<&PeerSocket> {
        self.peers.get(peer as usize)?.as_ref()
    }

    /// Accept every pending connection into free slots (non-blocking).
    ///
    /// Returns the number of clients accepted.
    pub fn accept(&mut self) -> usize {
        let mut accepted = 0;
        loop {
            let (stream, addr) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("TCP: accept error: {}", e);
                    break;
                }
            };

            let Some(slot) = self.peers.iter().position(Option::is_none) else {
                warn!("TCP: all {} slots busy, refusing {}", MAX_PEERS, addr);
                continue;
            };
            if stream.set_nonblocking(true).is_err() {
                warn!("TCP: failed to set non-blocking on {}", addr);
                continue;
            }

            info!("TCP[{}]: client connected from {}", slot, addr);
            self.peers[slot] = Some(PeerSocket::new(stream, addr));
            accepted += 1;
        }
        accepted
    }

    /// Close the client in `peer`, freeing the slot.
    pub fn disconnect(&mut self, peer: PeerId) {
        if let Some(socket) = self.peers.get_mut(peer as usize).and_then(Option::take) {
            info!("TCP[{}]: client {} disconnected", peer, socket.addr);
        }
    }

    fn socket_mut(&mut self, peer: PeerId) -> Option<&mut PeerSocket> {
        self.peers.get_mut(peer as usize)?.as_mut()
    }

    /// Top up `peer`'s buffer, dropping the slot on EOF or error.
    fn fill(&mut self, peer: PeerId) -> usize {
        let Some(socket) = self.socket_mut(peer) else {
            return 0;
        };
        match socket.fill() {
            Fill::Ready(n) => n,
            Fill::Closed => {
                debug!("TCP[{}]: EOF", peer);
                self.disconnect(peer);
                0
            }
        }
    }
}

/// `w.write(data)`, retrying `WouldBlock` up to `retries` times.
fn write_with_retry<W: Write>(w: &mut W, data: &[u8], retries: u32) -> io::Result<usize> {
    let mut attempt = 0;
    loop {
        match w.write(data) {
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock && attempt < retries => {
                attempt += 1;
                std::thread::sleep(WRITE_RETRY_DELAY);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            other => return other,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// PeerTransport implementation
// ───────────────────────────────────────────────────────────────

impl PeerTransport for TcpTransport {
    type Error = TcpTransportError;

    fn is_connected(&self, peer: PeerId) -> bool {
        self.peer(peer).is_some()
    }

    fn available(&mut self, peer: PeerId) -> usize {
        self.fill(peer)
    }

    fn read_byte(&mut self, peer: PeerId) -> Option<u8> {
        if self.fill(peer) == 0 {
            return None;
        }
        self.socket_mut(peer)?.take()
    }

    fn write_bytes(&mut self, peer: PeerId, data: &[u8]) -> Result<usize, TcpTransportError> {
        let socket = self.socket_mut(peer).ok_or(TcpTransportError::NotConnected)?;
        match write_with_retry(&mut socket.stream, data, WRITE_RETRIES) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                warn!("TCP[{}]: send buffer full, giving up", peer);
                Ok(0)
            }
            Err(e) => {
                warn!("TCP[{}]: write failed: {}", peer, e);
                self.disconnect(peer);
                Err(TcpTransportError::Io)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
