//! Line codec: pulls one `\n`-terminated line from a peer.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────┬──────┬──────┐
//! │ line bytes (0..N)        │ [\r] │  \n  │
//! └──────────────────────────┴──────┴──────┘
//! ```
//!
//! Bytes are taken one at a time from the transport so nothing past the
//! terminator is consumed. A line ends at the terminator, when the buffer
//! is full, or when the deadline passes. A buffer-full cut is reported as
//! [`LineStatus::Truncated`]; the next read returns the tail of the same
//! physical line, which may be just the terminator. While the peer has nothing
//! buffered the reader yields through [`Clock::delay_ms`], so a silent
//! peer holds the router for at most `timeout_ms`.

use heapless::Vec;

use super::clock::Clock;
use super::session::PeerId;
use super::transport::PeerTransport;
use crate::error::RequestError;

/// Outcome of a successful [`read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// A non-empty line of the given length (after `\r` stripping).
    Line(usize),
    /// The terminator came first: end of the header block, unless the
    /// previous read was [`LineStatus::Truncated`].
    Blank,
    /// The buffer filled before the terminator. The rest of the line is
    /// still in the transport.
    Truncated(usize),
}

/// Read one line from `peer` into `buf`.
///
/// `buf` is cleared first; its capacity is the maximum line length. A
/// trailing `\r` is stripped. If the buffer fills before a terminator is
/// seen, the bytes read so far are returned as [`LineStatus::Truncated`]
/// and the rest of the physical line stays in the transport.
pub fn read_line<T, K, const N: usize>(
    transport: &mut T,
    clock: &K,
    peer: PeerId,
    buf: &mut Vec<u8, N>,
    timeout_ms: u32,
) -> Result<LineStatus, RequestError>
where
    T: PeerTransport,
    K: Clock,
{
    buf.clear();
    let deadline = clock.now_ms().saturating_add(u64::from(timeout_ms));
    let mut cut = false;

    loop {
        if !transport.is_connected(peer) {
            return Err(RequestError::PeerClosed);
        }

        if transport.available(peer) > 0 {
            if let Some(byte) = transport.read_byte(peer) {
                if byte == b'\n' {
                    break;
                }
                // Capacity checked first, so push cannot fail.
                let _ = buf.push(byte);
                if buf.is_full() {
                    cut = true;
                    break;
                }
                continue;
            }
        }

        if clock.now_ms() >= deadline {
            buf.clear();
            return Err(RequestError::Timeout);
        }
        clock.delay_ms(1);
    }

    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    if cut {
        Ok(LineStatus::Truncated(buf.len()))
    } else if buf.is_empty() {
        Ok(LineStatus::Blank)
    } else {
        Ok(LineStatus::Line(buf.len()))
    }
}
