//! Integration tests: full request exchanges through `RpcEngine`.

use std::cell::{Cell, RefCell};

use httprpc::config::{ErrorPolicy, RouterConfig};
use httprpc::drivers::rgb_led::{LedState, RgbLed, SimPin};
use httprpc::error::{Error, RequestError};
use httprpc::rpc::engine::{Exchange, RpcEngine};
use httprpc::rpc::response::StatusCode;
use httprpc::rpc::rules::{RpcResult, rpc_result};

use crate::mock_transport::{FakeClock, ScriptedTransport, parse_response};

const TIMEOUT_MS: u32 = 50;

// ── Fixtures ──────────────────────────────────────────────────

/// Records every callback invocation.
#[derive(Default)]
struct Probe {
    calls: Cell<u32>,
    args: RefCell<Vec<String>>,
}

impl Probe {
    fn calls(&self) -> u32 {
        self.calls.get()
    }

    fn last_args(&self) -> Option<String> {
        self.args.borrow().last().cloned()
    }
}

fn record(probe: &&Probe, args: &str) -> RpcResult {
    probe.calls.set(probe.calls.get() + 1);
    probe.args.borrow_mut().push(args.to_string());
    rpc_result("1")
}

fn version(_: &&Probe, _: &str) -> RpcResult {
    rpc_result("1.0.0")
}

fn config(policy: ErrorPolicy) -> RouterConfig {
    RouterConfig {
        request_timeout_ms: TIMEOUT_MS,
        error_policy: policy,
        ..RouterConfig::default()
    }
}

fn engine_with(probe: &Probe, config: RouterConfig) -> RpcEngine<'_, &Probe> {
    let mut engine = RpcEngine::new(config);
    engine.add_rule(probe, "LED", "set", &record).unwrap();
    engine.add_rule(probe, "LED", "off", &record).unwrap();
    engine.add_rule(probe, "SYS", "version", &version).unwrap();
    engine
}

fn engine(probe: &Probe, policy: ErrorPolicy) -> RpcEngine<'_, &Probe> {
    engine_with(probe, config(policy))
}

fn get(uri: &str) -> String {
    format!("GET {uri} HTTP/1.1\r\nHost: 192.168.1.6\r\nUser-Agent: test\r\n\r\n")
}

// ── Dispatch ──────────────────────────────────────────────────

#[test]
fn led_set_end_to_end() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    let clock = FakeClock::new();

    t.send(2, &get("/LED%20set%20ON%20OFF%20ON"));
    let summary = engine.poll(&mut t, &clock);
    assert_eq!(summary.served, 1);
    assert_eq!(summary.responded, 1);

    let raw = t.output(2);
    let r = parse_response(&raw);
    assert_eq!(r.status_line, "HTTP/1.1 200 OK");
    assert_eq!(r.header("Content-type"), Some("application/jsonRpc"));
    assert_eq!(r.header("Accept"), Some("application/jsonRpc"));
    assert_eq!(r.content_length(), r.body.len());
    assert_eq!(r.body, r#"{"result": "1", "error": 0, "id": 2}"#);

    let json = r.json();
    assert_eq!(json["result"], "1");
    assert_eq!(json["error"], 0);
    assert_eq!(json["id"], 2);

    assert_eq!(probe.calls(), 1);
    assert_eq!(probe.last_args().as_deref(), Some("ON OFF ON "));
}

#[test]
fn every_registered_pair_dispatches_without_arguments() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let clock = FakeClock::new();

    for (uri, expected) in [
        ("/LED%20set", "1"),
        ("/LED%20off", "1"),
        ("/SYS%20version", "1.0.0"),
    ] {
        let mut t = ScriptedTransport::new();
        t.send(0, &get(uri));
        assert_eq!(
            engine.serve_peer(0, &mut t, &clock),
            Exchange::Responded(StatusCode::Ok)
        );
        let r = parse_response(&t.output(0));
        assert_eq!(r.json()["result"], expected, "{uri}");
    }
    assert_eq!(probe.args.borrow().as_slice(), ["", ""]);
}

#[test]
fn slash_separated_function_is_accepted() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED/set%20ON%20ON%20ON"));
    engine.poll(&mut t, &FakeClock::new());

    assert_eq!(parse_response(&t.output(0)).code, 200);
    assert_eq!(probe.last_args().as_deref(), Some("ON ON ON "));
}

#[test]
fn drives_rgb_led() {
    type Led = RgbLed<SimPin, SimPin, SimPin>;

    fn set(led: &&RefCell<Led>, args: &str) -> RpcResult {
        match led.borrow_mut().apply(args) {
            Ok(_) => rpc_result("0"),
            Err(e) => match e {},
        }
    }

    let led = RefCell::new(RgbLed::new(SimPin::new(), SimPin::new(), SimPin::new()).unwrap());
    let mut engine: RpcEngine<'_, &RefCell<Led>> = RpcEngine::new(config(ErrorPolicy::Respond));
    engine.add_rule(&led, "LED", "set", &set).unwrap();

    let mut t = ScriptedTransport::new();
    t.send(1, &get("/LED%20set%20ON%20OFF%20ON"));
    engine.poll(&mut t, &FakeClock::new());

    assert_eq!(parse_response(&t.output(1)).json()["result"], "0");
    assert_eq!(
        led.borrow().state(),
        LedState {
            red: true,
            green: false,
            blue: true
        }
    );
}

#[test]
fn http10_is_echoed() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, "GET /SYS%20version HTTP/1.0\r\n\r\n");
    engine.poll(&mut t, &FakeClock::new());
    assert!(t.output(0).starts_with("HTTP/1.0 200 OK\r\n"));
}

#[test]
fn lf_only_line_endings_accepted() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, "GET /LED%20set%20ON HTTP/1.1\nHost: x\n\n");
    engine.poll(&mut t, &FakeClock::new());
    assert_eq!(parse_response(&t.output(0)).code, 200);
    assert_eq!(probe.last_args().as_deref(), Some("ON "));
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn unknown_class_is_bad_request_under_both_policies() {
    for policy in [ErrorPolicy::Respond, ErrorPolicy::Drop] {
        let probe = Probe::default();
        let mut engine = engine(&probe, policy);
        let entries_before: Vec<_> = engine
            .rules()
            .entries()
            .map(|(c, f)| (c.to_string(), f.to_string()))
            .collect();
        let mut t = ScriptedTransport::new();

        t.send(0, &get("/unknown%20foo"));
        assert_eq!(
            engine.serve_peer(0, &mut t, &FakeClock::new()),
            Exchange::Responded(StatusCode::BadRequest)
        );

        let r = parse_response(&t.output(0));
        assert_eq!(r.status_line, "HTTP/1.1 400 Bad Request");
        assert_eq!(r.content_length(), 0);
        assert!(r.body.is_empty());
        assert_eq!(probe.calls(), 0);

        let entries_after: Vec<_> = engine
            .rules()
            .entries()
            .map(|(c, f)| (c.to_string(), f.to_string()))
            .collect();
        assert_eq!(entries_before, entries_after);
    }
}

#[test]
fn unknown_function_is_bad_request() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED%20blink%20fast"));
    engine.poll(&mut t, &FakeClock::new());
    assert_eq!(parse_response(&t.output(0)).code, 400);
    assert_eq!(probe.calls(), 0);
}

#[test]
fn over_long_arguments_respond_413() {
    let probe = Probe::default();
    let mut engine = engine_with(
        &probe,
        RouterConfig {
            max_args_len: 8,
            ..config(ErrorPolicy::Respond)
        },
    );
    let mut t = ScriptedTransport::new();

    // "ON OFF ON " is 10 bytes.
    t.send(0, &get("/LED%20set%20ON%20OFF%20ON"));
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Responded(StatusCode::PayloadTooLarge)
    );
    let r = parse_response(&t.output(0));
    assert_eq!(r.status_line, "HTTP/1.1 413 Payload Too Large");
    assert_eq!(r.content_length(), 0);
    assert_eq!(probe.calls(), 0, "callback must not run");
    assert!(engine.pending(0).unwrap().args.is_empty());
}

#[test]
fn over_long_arguments_dropped_silently() {
    let probe = Probe::default();
    let mut engine = engine_with(
        &probe,
        RouterConfig {
            max_args_len: 8,
            ..config(ErrorPolicy::Drop)
        },
    );
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED%20set%20ON%20OFF%20ON"));
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Dropped(RequestError::CommandTooLong)
    );
    assert!(t.output(0).is_empty());
    assert_eq!(probe.calls(), 0);

    // Arguments that fit still dispatch.
    t.send(0, &get("/LED%20set%20ON%20OFF"));
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Responded(StatusCode::Ok)
    );
    assert_eq!(probe.last_args().as_deref(), Some("ON OFF "));
}

#[test]
fn malformed_request_line_follows_policy() {
    let probe = Probe::default();
    let mut respond = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    t.send(0, "GARBAGE\r\nHost: x\r\n\r\n");
    assert_eq!(
        respond.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Responded(StatusCode::BadRequest)
    );
    assert_eq!(parse_response(&t.output(0)).code, 400);
    // The header block was drained with the request.
    assert_eq!(t.unread(0), 0);

    let mut silent = engine(&probe, ErrorPolicy::Drop);
    let mut t = ScriptedTransport::new();
    t.send(0, "GET /LED%20set HTTP/9.9\r\nHost: x\r\n\r\n");
    assert_eq!(
        silent.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Dropped(RequestError::MalformedRequest)
    );
    assert!(t.output(0).is_empty());
    assert_eq!(t.unread(0), 0);
    assert_eq!(probe.calls(), 0);
}

#[test]
fn header_filling_the_line_buffer_yields_one_response() {
    use httprpc::config::MAX_LINE_LEN;

    for len in [MAX_LINE_LEN - 1, MAX_LINE_LEN] {
        let probe = Probe::default();
        let mut engine = engine(&probe, ErrorPolicy::Respond);
        let mut t = ScriptedTransport::new();
        let clock = FakeClock::new();

        let cookie = format!("Cookie: {}", "a".repeat(len - "Cookie: ".len()));
        t.send(
            0,
            &format!(
                "GET /LED%20set HTTP/1.1\r\n{cookie}\r\nUser-Agent: curl\r\nAccept: */*\r\n\r\n"
            ),
        );

        assert_eq!(
            engine.serve_peer(0, &mut t, &clock),
            Exchange::Responded(StatusCode::Ok),
            "{len}-byte header"
        );
        assert_eq!(t.unread(0), 0, "{len}-byte header");

        let summary = engine.poll(&mut t, &clock);
        assert_eq!(summary.served, 0);
        let out = t.output(0);
        assert_eq!(out.matches("HTTP/1.1 ").count(), 1, "{out}");
        assert_eq!(parse_response(&out).json()["result"], "1");
        assert_eq!(probe.calls(), 1);
    }
}

#[test]
fn non_get_methods_are_not_found() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);

    for method in ["POST", "PUT", "HEAD", "DELETE", "OPTIONS"] {
        let mut t = ScriptedTransport::new();
        t.send(0, &format!("{method} /LED%20set%20ON HTTP/1.1\r\n\r\n"));
        assert_eq!(
            engine.serve_peer(0, &mut t, &FakeClock::new()),
            Exchange::Responded(StatusCode::NotFound),
            "{method}"
        );
    }
    assert_eq!(probe.calls(), 0);
}

// ── Timeouts and lifecycle ────────────────────────────────────

#[test]
fn missing_blank_line_abandons_then_next_poll_is_clean() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    let clock = FakeClock::new();

    t.send(0, "GET /LED%20set%20ON%20ON HTTP/1.1\r\nHost: x\r\n");
    assert_eq!(
        engine.serve_peer(0, &mut t, &clock),
        Exchange::Responded(StatusCode::NotFound)
    );
    assert!(clock.elapsed() >= u64::from(TIMEOUT_MS));
    assert_eq!(parse_response(&t.output(0)).code, 404);
    assert_eq!(probe.calls(), 0);
    assert!(engine.pending(0).unwrap().is_clear());

    // A fresh request without arguments must not see the old ones.
    t.peers[0].tx.clear();
    t.send(0, &get("/LED%20off"));
    engine.poll(&mut t, &clock);
    assert_eq!(parse_response(&t.output(0)).code, 200);
    assert_eq!(probe.last_args().as_deref(), Some(""));
}

#[test]
fn incomplete_request_line_times_out_silently() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    let clock = FakeClock::new();

    t.send(0, "GET /LED%20se");
    let summary = engine.poll(&mut t, &clock);
    assert_eq!(summary.abandoned, 1);
    assert!(t.output(0).is_empty());
    assert!(engine.pending(0).unwrap().is_clear());
}

#[test]
fn peer_closing_mid_headers_is_dropped() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, "GET /LED%20set HTTP/1.1\r\nHost: x\r\n")
        .close_when_drained = true;
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Dropped(RequestError::PeerClosed)
    );
    assert!(t.output(0).is_empty());
    assert_eq!(probe.calls(), 0);
}

#[test]
fn stray_blank_line_is_ignored() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    let clock = FakeClock::new();

    t.send(0, "\r\n");
    assert_eq!(engine.serve_peer(0, &mut t, &clock), Exchange::Idle);
    t.send(0, &get("/SYS%20version"));
    assert_eq!(
        engine.serve_peer(0, &mut t, &clock),
        Exchange::Responded(StatusCode::Ok)
    );
}

#[test]
fn poll_serves_each_peer_with_its_own_id() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED%20set%20A"));
    t.send(3, &get("/LED%20set%20B"));
    t.send(4, "");

    let summary = engine.poll(&mut t, &FakeClock::new());
    assert_eq!(summary.served, 2);
    assert_eq!(summary.responded, 2);

    assert_eq!(parse_response(&t.output(0)).json()["id"], 0);
    assert_eq!(parse_response(&t.output(3)).json()["id"], 3);
    assert!(t.output(4).is_empty());
    assert_eq!(probe.args.borrow().as_slice(), ["A ", "B "]);
}

#[test]
fn idle_poll_does_nothing() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();
    let clock = FakeClock::new();

    let summary = engine.poll(&mut t, &clock);
    assert_eq!(summary.served, 0);
    assert_eq!(clock.elapsed(), 0, "no peer, no waiting");
}

// ── Output path ───────────────────────────────────────────────

#[test]
fn partial_writes_are_completed() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED%20set%20ON")).write_limit = Some(7);
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Responded(StatusCode::Ok)
    );
    let r = parse_response(&t.output(0));
    assert_eq!(r.content_length(), r.body.len());
    assert_eq!(r.json()["result"], "1");
}

#[test]
fn write_failure_is_reported_and_state_cleared() {
    let probe = Probe::default();
    let mut engine = engine(&probe, ErrorPolicy::Respond);
    let mut t = ScriptedTransport::new();

    t.send(0, &get("/LED%20set%20ON")).fail_writes = true;
    assert_eq!(
        engine.serve_peer(0, &mut t, &FakeClock::new()),
        Exchange::Failed(Error::Transport)
    );
    assert_eq!(probe.calls(), 1);
    assert!(engine.pending(0).unwrap().is_clear());
}
