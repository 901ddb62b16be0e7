//! URI tokenizer and rule matcher.
//!
//! Grammar:
//! ```text
//! /<class>(%20|/)<function>(%20<arg>)*
//! ```
//!
//! The class segment ends at the first `/` or `%20`. The rest is split on
//! the literal `%20`; empty tokens (from `%20%20`) are skipped. The first
//! token names the function, the remaining tokens are the arguments, which
//! are flattened into one string with a single space after each argument:
//! `ON%20OFF%20ON` becomes `"ON OFF ON "`.
//!
//! Tokenizing state is a [`Cursor`] (a byte offset) passed by value, so the
//! matcher holds no state between calls.

use heapless::String;

use super::rules::{FunctionIndex, RuleIndex, RuleTable};
use crate::error::RequestError;

/// Escaped space separating function and argument tokens.
const SPACE: &str = "%20";

/// A resolved (class, function) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub rule: RuleIndex,
    pub function: FunctionIndex,
}

/// Read position within a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pos: usize,
}

impl Cursor {
    pub const fn at(pos: usize) -> Self {
        Self { pos }
    }

    /// Next non-empty `%20`-delimited token at or after this cursor.
    ///
    /// Returns the token and the cursor just past its delimiter, or `None`
    /// once the URI is exhausted.
    pub fn next_token(self, uri: &str) -> Option<(&str, Cursor)> {
        let mut pos = self.pos;
        loop {
            let rest = uri.get(pos..)?;
            if rest.is_empty() {
                return None;
            }
            match rest.find(SPACE) {
                Some(0) => pos += SPACE.len(),
                Some(end) => return Some((&rest[..end], Cursor::at(pos + end + SPACE.len()))),
                None => return Some((rest, Cursor::at(uri.len()))),
            }
        }
    }
}

/// Split off the class segment.
///
/// Leading slashes are skipped; the segment ends at the next `/` or `%20`.
/// Returns `None` for a URI made only of slashes.
pub fn split_class(uri: &str) -> Option<(&str, Cursor)> {
    let start = uri.find(|c: char| c != '/')?;
    let rest = &uri[start..];

    let slash = rest.find('/').map(|i| (i, 1));
    let space = rest.find(SPACE).map(|i| (i, SPACE.len()));
    let delimiter = match (slash, space) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    Some(match delimiter {
        Some((end, len)) => (&rest[..end], Cursor::at(start + end + len)),
        None => (rest, Cursor::at(uri.len())),
    })
}

/// Match `uri` against `table` and write the flattened arguments to `args`.
///
/// First-match in registration order for both class and function. If the
/// arguments do not fit `args` the call fails with `CommandTooLong` and
/// `args` is left empty, so a callback never sees a partial argument list.
pub fn resolve<C, const N: usize>(
    table: &RuleTable<'_, C>,
    uri: &str,
    args: &mut String<N>,
) -> Result<RouteMatch, RequestError> {
    args.clear();

    let (class, cursor) = split_class(uri).ok_or(RequestError::CommandNotRecognized)?;
    let rule = table
        .find_class(class)
        .ok_or(RequestError::CommandNotRecognized)?;

    let (function, mut cursor) = cursor
        .next_token(uri)
        .ok_or(RequestError::CommandNotRecognized)?;
    let function = table
        .find_function(rule, function)
        .ok_or(RequestError::CommandNotRecognized)?;

    while let Some((arg, next)) = cursor.next_token(uri) {
        if args.len() + arg.len() + 1 > N {
            args.clear();
            return Err(RequestError::CommandTooLong);
        }
        // Length checked above.
        let _ = args.push_str(arg);
        let _ = args.push(' ');
        cursor = next;
    }

    Ok(RouteMatch { rule, function })
}
