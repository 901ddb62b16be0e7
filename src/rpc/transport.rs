//! Transport abstraction: a multi-slot, byte-oriented peer channel.
//!
//! Concrete implementations:
//! - Non-blocking TCP server with a fixed number of client slots
//!   ([`TcpTransport`](crate::adapters::tcp_transport::TcpTransport))
//! - Scripted in-memory peers (integration tests)
//!
//! The router never touches sockets. Each connected client occupies a
//! slot identified by a [`PeerId`]; the transport owns that slot's receive
//! buffer and read cursor.

use super::session::PeerId;

/// Byte-stream contract the router consumes.
pub trait PeerTransport {
    /// Error type for writes.
    type Error: core::fmt::Debug;

    /// Whether a client currently occupies `peer`.
    fn is_connected(&self, peer: PeerId) -> bool;

    /// Number of bytes buffered and ready for [`read_byte`](Self::read_byte).
    fn available(&mut self, peer: PeerId) -> usize;

    /// Take the next byte from the peer's stream, advancing its cursor.
    /// Returns `None` if nothing is buffered (non-blocking).
    fn read_byte(&mut self, peer: PeerId) -> Option<u8>;

    /// Write `data` to the peer.
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, peer: PeerId, data: &[u8]) -> Result<usize, Self::Error>;
}

/// A null transport with no connected peers.
/// Useful as a default before the network is up.
pub struct NullTransport;

impl PeerTransport for NullTransport {
    type Error = ();

    fn is_connected(&self, _peer: PeerId) -> bool {
        false
    }

    fn available(&mut self, _peer: PeerId) -> usize {
        0
    }

    fn read_byte(&mut self, _peer: PeerId) -> Option<u8> {
        None
    }

    fn write_bytes(&mut self, _peer: PeerId, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }
}
