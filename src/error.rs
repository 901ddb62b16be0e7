//! Unified error types for the HTTP/RPC router.
//!
//! Request-time failures and registration-time failures are separate enums
//! so each API returns exactly the variants it can produce. Both convert into
//! the top-level [`Error`]. All variants are `Copy`.

use core::fmt;

use crate::rpc::response::StatusCode;

// ---------------------------------------------------------------------------
// Top-level router error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A single request exchange failed.
    Request(RequestError),
    /// A rule could not be registered.
    Registration(RegistrationError),
    /// The transport refused or truncated a write.
    Transport,
    /// A formatted field did not fit its fixed-capacity buffer.
    /// Capacities are compile-time constants, so this is a build
    /// configuration fault rather than a client error.
    BufferOverflow,
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request: {e}"),
            Self::Registration(e) => write!(f, "registration: {e}"),
            Self::Transport => write!(f, "transport write failed"),
            Self::BufferOverflow => write!(f, "response buffer overflow"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// No line terminator arrived before the deadline.
    Timeout,
    /// The peer disconnected mid-exchange.
    PeerClosed,
    /// The request line did not parse.
    MalformedRequest,
    /// Class or function is not in the rule table.
    CommandNotRecognized,
    /// The argument string would exceed its buffer.
    CommandTooLong,
}

impl RequestError {
    /// Status code reported to the client for this failure.
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Timeout | Self::PeerClosed => StatusCode::NotFound,
            Self::MalformedRequest | Self::CommandNotRecognized => StatusCode::BadRequest,
            Self::CommandTooLong => StatusCode::PayloadTooLarge,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::PeerClosed => write!(f, "peer closed"),
            Self::MalformedRequest => write!(f, "malformed request"),
            Self::CommandNotRecognized => write!(f, "RPC command not recognized"),
            Self::CommandTooLong => write!(f, "RPC command too long"),
        }
    }
}

impl core::error::Error for RequestError {}

impl From<RequestError> for Error {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

// ---------------------------------------------------------------------------
// Registration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// Every class slot is taken.
    RuleTableFull,
    /// The class already holds its maximum number of functions.
    FunctionListFull,
    /// The class+function pair is already registered.
    DuplicateRule,
    /// Class or function name exceeds its bound.
    NameTooLong,
    /// Class or function name is empty.
    EmptyName,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleTableFull => write!(f, "rule table is full"),
            Self::FunctionListFull => write!(f, "function list is full"),
            Self::DuplicateRule => write!(f, "rule already registered"),
            Self::NameTooLong => write!(f, "name too long"),
            Self::EmptyName => write!(f, "name is empty"),
        }
    }
}

impl core::error::Error for RegistrationError {}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Router-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
