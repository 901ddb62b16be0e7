//! Per-peer request staging.
//!
//! Every connected slot gets its own [`PendingRequest`] holding the raw line
//! buffer, the decoded request line, the flattened argument string and the
//! callback result. Nothing is shared between slots, and a slot's buffers
//! are cleared at the end of every exchange, whatever its outcome.

use heapless::{String, Vec};

use super::request::RequestLine;
use super::rules::RpcResult;
use crate::config::{MAX_ARGS_LEN, MAX_LINE_LEN};

pub use crate::config::MAX_PEERS;

/// Peer identifier (index into the slot tables).
pub type PeerId = u8;

/// Ephemeral state of one request exchange.
#[derive(Debug, Default)]
pub struct PendingRequest {
    /// Bytes of the line currently being read.
    pub line: Vec<u8, MAX_LINE_LEN>,
    /// Decoded request line, once parsed.
    pub request: Option<RequestLine>,
    /// Space-joined arguments for the callback.
    pub args: String<MAX_ARGS_LEN>,
    /// Result string returned by the callback.
    pub result: RpcResult,
}

impl PendingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything staged for the current exchange.
    pub fn clear(&mut self) {
        self.line.clear();
        self.request = None;
        self.args.clear();
        self.result.clear();
    }

    /// True when no data from a previous exchange is left behind.
    pub fn is_clear(&self) -> bool {
        self.line.is_empty() && self.request.is_none() && self.args.is_empty() && self.result.is_empty()
    }
}

/// Fixed-size table of per-peer pending requests.
///
/// Slots are indexed by `PeerId` (0..MAX_PEERS).
pub struct PendingTable {
    slots: [PendingRequest; MAX_PEERS],
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| PendingRequest::new()),
        }
    }

    /// Get a mutable reference to the pending request for `peer`.
    pub fn get_mut(&mut self, peer: PeerId) -> Option<&mut PendingRequest> {
        self.slots.get_mut(peer as usize)
    }

    /// Get a shared reference to the pending request for `peer`.
    pub fn get(&self, peer: PeerId) -> Option<&PendingRequest> {
        self.slots.get(peer as usize)
    }

    /// Clear a specific peer's state (e.g. on disconnect).
    pub fn reset_peer(&mut self, peer: PeerId) {
        if let Some(p) = self.slots.get_mut(peer as usize) {
            p.clear();
        }
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}
