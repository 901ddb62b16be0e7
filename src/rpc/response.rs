//! Response envelope builder.
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-type: application/jsonRpc\r\n
//! Content-length: 42\r\n
//! Accept: application/jsonRpc\r\n
//! \r\n
//! {"result": "1", "error": 0, "id": 3}
//! ```
//!
//! Both parts are staged in fixed-capacity buffers. The `const` assertions
//! below prove at build time that the worst-case body and header fit, so a
//! runtime overflow means the capacities in [`config`](crate::config) were
//! edited inconsistently.

use core::fmt::{self, Write};

use heapless::String;

use super::request::Version;
use super::session::PeerId;
use super::transport::PeerTransport;
use crate::config::{MAX_BODY_LEN, MAX_HEADER_LEN, MAX_RESULT_LEN};
use crate::error::Error;

/// Content type advertised in `Content-type` and `Accept`.
pub const CONTENT_TYPE: &str = "application/jsonRpc";

const BODY_OPEN: &str = "{\"result\": \"";
const BODY_MID: &str = "\", \"error\": 0, \"id\": ";
const BODY_CLOSE: &str = "}";
/// Decimal digits of the largest `PeerId`.
const PEER_ID_DIGITS: usize = 3;

const _: () = assert!(
    MAX_BODY_LEN
        >= BODY_OPEN.len() + MAX_RESULT_LEN + BODY_MID.len() + PEER_ID_DIGITS + BODY_CLOSE.len()
);

const LONGEST_REASON: usize = "Payload Too Large".len();
const STATUS_LINE_MAX: usize = "HTTP/1.1 000 \r\n".len() + LONGEST_REASON;
const HEADER_FIELDS: usize = "Content-type: \r\nContent-length: \r\nAccept: \r\n\r\n".len()
    + 2 * CONTENT_TYPE.len()
    + 3; // digits of MAX_BODY_LEN

const _: () = assert!(MAX_BODY_LEN < 1000);
const _: () = assert!(MAX_HEADER_LEN >= STATUS_LINE_MAX + HEADER_FIELDS);

/// Response status codes used by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StatusCode {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    PayloadTooLarge = 413,
}

impl StatusCode {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::PayloadTooLarge => "Payload Too Large",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A fully formatted response, ready to write.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    header: String<MAX_HEADER_LEN>,
    body: String<MAX_BODY_LEN>,
}

impl Response {
    /// Successful RPC reply carrying the callback's result.
    pub fn rpc_result(version: Version, result: &str, peer: PeerId) -> Result<Self, Error> {
        let mut body = String::new();
        write!(body, "{BODY_OPEN}{result}{BODY_MID}{peer}{BODY_CLOSE}")
            .map_err(|_| Error::BufferOverflow)?;
        Self::with_body(StatusCode::Ok, version, body)
    }

    /// Error reply: status line and headers, empty body.
    pub fn status_only(status: StatusCode, version: Version) -> Result<Self, Error> {
        Self::with_body(status, version, String::new())
    }

    fn with_body(
        status: StatusCode,
        version: Version,
        body: String<MAX_BODY_LEN>,
    ) -> Result<Self, Error> {
        let mut header = String::new();
        write!(
            header,
            "{} {}\r\nContent-type: {CONTENT_TYPE}\r\nContent-length: {}\r\nAccept: {CONTENT_TYPE}\r\n\r\n",
            version.as_str(),
            status,
            body.len(),
        )
        .map_err(|_| Error::BufferOverflow)?;
        Ok(Self {
            status,
            header,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Write header then body to `peer`, retrying partial writes.
    pub fn write_to<T: PeerTransport>(&self, transport: &mut T, peer: PeerId) -> Result<(), Error> {
        write_all(transport, peer, self.header.as_bytes())?;
        write_all(transport, peer, self.body.as_bytes())
    }
}

fn write_all<T: PeerTransport>(transport: &mut T, peer: PeerId, mut data: &[u8]) -> Result<(), Error> {
    while !data.is_empty() {
        match transport.write_bytes(peer, data) {
            Ok(0) | Err(_) => return Err(Error::Transport),
            Ok(n) => data = &data[n.min(data.len())..],
        }
    }
    Ok(())
}
