//! Fuzz target: URI tokenizer and rule matcher
//!
//! Resolves arbitrary URIs against a small fixed table. The matcher must
//! never panic, must leave the argument buffer empty on failure, and on
//! success the argument string ends with a space.
//!
//! cargo fuzz run fuzz_uri_resolve

#![no_main]

use heapless::String;
use libfuzzer_sys::fuzz_target;
use httprpc::config::MAX_ARGS_LEN;
use httprpc::rpc::rules::{RpcResult, RuleTable, rpc_result};

fn ok(_: &(), _: &str) -> RpcResult {
    rpc_result("0")
}

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };

    let mut table = RuleTable::new();
    let _ = table.add_rule((), "LED", "set", &ok);
    let _ = table.add_rule((), "LED", "off", &ok);
    let _ = table.add_rule((), "SYS", "version", &ok);

    let mut args: String<MAX_ARGS_LEN> = String::new();
    match table.resolve(uri, &mut args) {
        Ok(route) => {
            assert!(table.invoke(route, &args).is_some());
            assert!(args.is_empty() || args.ends_with(' '));
            assert!(!args.contains("%20"));
        }
        Err(_) => assert!(args.is_empty()),
    }
});
