//! Fuzz target: `parse_request_bytes`
//!
//! Arbitrary bytes must never panic the request-line parser, and anything
//! it accepts must re-serialise to exactly the input line.
//!
//! cargo fuzz run fuzz_request_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use httprpc::config::MAX_URI_LEN;
use httprpc::rpc::request::parse_request_bytes;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = parse_request_bytes(data) {
        assert!(!req.uri.is_empty());
        assert!(req.uri.len() <= MAX_URI_LEN);

        let line = format!("{} {} {}", req.method, req.uri, req.version.as_str());
        assert_eq!(line.as_bytes(), data);
    }
});
