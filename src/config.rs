//! Router configuration parameters
//!
//! Buffer and table capacities are compile-time constants: every staging
//! buffer in the router is a fixed-capacity `heapless` container sized by
//! these values. Runtime knobs (port, timeout, error policy) live in
//! [`RouterConfig`] and can be loaded from a JSON file.

use serde::{Deserialize, Serialize};

// --- Rule table ---

/// Number of class slots in the rule table.
pub const MAX_RULES: usize = 5;
/// Number of functions each class can hold.
pub const MAX_FUNCTIONS: usize = 3;
/// Longest accepted class name (bytes).
pub const MAX_CLASS_LEN: usize = 32;
/// Longest accepted function name (bytes).
pub const MAX_FUNCTION_LEN: usize = 32;

// --- Request staging ---

/// Capacity of the flattened argument string handed to callbacks.
pub const MAX_ARGS_LEN: usize = 255;
/// Capacity of a callback's result string.
pub const MAX_RESULT_LEN: usize = 32;
/// Longest URI accepted on the request line.
pub const MAX_URI_LEN: usize = 200;
/// Capacity of the per-peer line buffer (request line and header lines).
pub const MAX_LINE_LEN: usize = 255;

// --- Response staging ---

/// Capacity of the JSON response body.
pub const MAX_BODY_LEN: usize = 127;
/// Capacity of the status line plus header block.
pub const MAX_HEADER_LEN: usize = 255;

// --- Peers and timing ---

/// Number of concurrently connected peer slots.
pub const MAX_PEERS: usize = 5;
/// Per-line read deadline (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u32 = 3000;
/// Default TCP listen port.
pub const DEFAULT_PORT: u16 = 80;

/// What to do when a request line is malformed or its arguments overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Answer with a 4xx status.
    #[default]
    Respond,
    /// Send nothing and go back to idle.
    Drop,
}

/// Runtime router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// TCP port the host transport listens on
    pub port: u16,
    /// Deadline for each line of a request (milliseconds)
    pub request_timeout_ms: u32,
    /// Sleep between poll passes when nothing is pending (milliseconds)
    pub idle_delay_ms: u32,
    /// Longest argument string handed to a callback (at most `MAX_ARGS_LEN`)
    pub max_args_len: usize,
    /// Reply or stay silent on malformed / oversized requests
    pub error_policy: ErrorPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            idle_delay_ms: 1,
            max_args_len: MAX_ARGS_LEN,
            error_policy: ErrorPolicy::Respond,
        }
    }
}

impl RouterConfig {
    /// Reject values the router cannot run with.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.request_timeout_ms == 0 {
            return Err(crate::error::Error::Config("request_timeout_ms must be non-zero"));
        }
        if self.max_args_len > MAX_ARGS_LEN {
            return Err(crate::error::Error::Config("max_args_len exceeds MAX_ARGS_LEN"));
        }
        Ok(())
    }
}
