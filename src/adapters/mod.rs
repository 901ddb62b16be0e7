//! Adapters: concrete implementations of the router's port traits.
//!
//! | Adapter         | Implements      | Connects to                    |
//! |-----------------|-----------------|--------------------------------|
//! | `tcp_transport` | PeerTransport   | Non-blocking `std::net` server |
//! | `time`          | Clock           | `std::time::Instant`           |

pub mod tcp_transport;
pub mod time;
