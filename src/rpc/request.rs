//! Request-line parser: `<METHOD> <URI> <VERSION>`.
//!
//! Only the first line of a request is interpreted. The parser recognizes
//! every HTTP/1.x method token, but the router itself only dispatches `GET`;
//! deciding what to do with the others is left to the caller.

use core::fmt;

use heapless::String;

use crate::config::MAX_URI_LEN;
use crate::error::RequestError;

/// Request method token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Options,
    Head,
    Delete,
    Trace,
    Connect,
}

impl Method {
    const ALL: [Self; 8] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Options,
        Self::Head,
        Self::Delete,
        Self::Trace,
        Self::Connect,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "HTTP/1.0" => Some(Self::Http10),
            "HTTP/1.1" => Some(Self::Http11),
            _ => None,
        }
    }
}

/// A decoded request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: String<MAX_URI_LEN>,
    pub version: Version,
}

/// Parse raw line bytes. Non-UTF-8 input is malformed.
pub fn parse_request_bytes(line: &[u8]) -> Result<RequestLine, RequestError> {
    let text = core::str::from_utf8(line).map_err(|_| RequestError::MalformedRequest)?;
    parse_request_line(text)
}

/// Split `line` on single spaces into exactly three tokens and decode them.
pub fn parse_request_line(line: &str) -> Result<RequestLine, RequestError> {
    let mut tokens = line.split(' ');
    let (Some(method), Some(uri), Some(version), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(RequestError::MalformedRequest);
    };

    let method = Method::from_token(method).ok_or(RequestError::MalformedRequest)?;
    let version = Version::from_token(version).ok_or(RequestError::MalformedRequest)?;

    if uri.is_empty() {
        return Err(RequestError::MalformedRequest);
    }
    let mut uri_buf = String::new();
    uri_buf
        .push_str(uri)
        .map_err(|()| RequestError::MalformedRequest)?;

    Ok(RequestLine {
        method,
        uri: uri_buf,
        version,
    })
}
