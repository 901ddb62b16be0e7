//! httprpc: host entry point.
//!
//! Serves the RGB LED demo over TCP.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  TcpTransport (PeerTransport)      MonotonicClock (Clock) │
//! │        │                                   │              │
//! │        ▼                                   ▼              │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │  RpcEngine::poll  ─▶  RuleTable  ─▶  callbacks      │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │                                            │              │
//! │                                 Board { RgbLed, clock }   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! `GET /LED%20set%20ON%20OFF%20ON HTTP/1.1` lights red and blue.
//!
//! Usage: `httprpc [config.json]`

use core::cell::RefCell;
use core::fmt::Write as _;

use anyhow::{Context, Result};
use log::{info, warn};

use httprpc::adapters::tcp_transport::TcpTransport;
use httprpc::adapters::time::MonotonicClock;
use httprpc::config::RouterConfig;
use httprpc::drivers::rgb_led::{RgbLed, SimPin};
use httprpc::rpc::clock::Clock;
use httprpc::rpc::engine::RpcEngine;
use httprpc::rpc::rules::{RpcResult, rpc_result};

// ── Board ─────────────────────────────────────────────────────

type Led = RgbLed<SimPin, SimPin, SimPin>;

/// Everything the callbacks can reach.
struct Board {
    led: RefCell<Led>,
    clock: MonotonicClock,
}

// ── Callbacks ─────────────────────────────────────────────────

/// `LED set <R> <G> <B>`
fn led_set(board: &&Board, args: &str) -> RpcResult {
    match board.led.borrow_mut().apply(args) {
        Ok(state) => {
            info!("LED: {}", state);
            rpc_result("0")
        }
        Err(e) => match e {},
    }
}

/// `LED on`
fn led_on(board: &&Board, _args: &str) -> RpcResult {
    match board.led.borrow_mut().all_on() {
        Ok(()) => rpc_result("0"),
        Err(e) => match e {},
    }
}

/// `LED off`
fn led_off(board: &&Board, _args: &str) -> RpcResult {
    match board.led.borrow_mut().all_off() {
        Ok(()) => rpc_result("0"),
        Err(e) => match e {},
    }
}

/// `SYS version`
fn sys_version(_board: &&Board, _args: &str) -> RpcResult {
    rpc_result(env!("CARGO_PKG_VERSION"))
}

/// `SYS uptime` (seconds)
fn sys_uptime(board: &&Board, _args: &str) -> RpcResult {
    let mut out = RpcResult::new();
    // u64 seconds always fit.
    let _ = write!(out, "{}", board.clock.uptime_secs());
    out
}

/// `SYS state`: LED channels as `"ON OFF ON"`.
fn sys_state(board: &&Board, _args: &str) -> RpcResult {
    let mut out = RpcResult::new();
    let _ = write!(out, "{}", board.led.borrow().state());
    out
}

// ── Config ────────────────────────────────────────────────────

fn load_config(path: Option<String>) -> Result<RouterConfig> {
    let Some(path) = path else {
        info!("Config: no file given, using defaults");
        return Ok(RouterConfig::default());
    };

    let config = match std::fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?,
        Err(e) => {
            warn!("Config: cannot read {} ({}), using defaults", path, e);
            RouterConfig::default()
        }
    };
    info!("Config loaded from {}", path);
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("httprpc v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(std::env::args().nth(1))?;
    config.validate()?;

    let board = Board {
        led: RefCell::new(RgbLed::new(SimPin::new(), SimPin::new(), SimPin::new())?),
        clock: MonotonicClock::new(),
    };

    let mut engine: RpcEngine<'_, &Board> = RpcEngine::new(config.clone());
    engine.add_rule(&board, "LED", "set", &led_set)?;
    engine.add_rule(&board, "LED", "on", &led_on)?;
    engine.add_rule(&board, "LED", "off", &led_off)?;
    engine.add_rule(&board, "SYS", "version", &sys_version)?;
    engine.add_rule(&board, "SYS", "uptime", &sys_uptime)?;
    engine.add_rule(&board, "SYS", "state", &sys_state)?;

    for (class, function) in engine.rules().entries() {
        info!("RPC: /{}%20{}", class, function);
    }

    let mut transport = TcpTransport::bind(config.port).context("binding listener")?;

    info!("System ready. Entering poll loop.");

    loop {
        transport.accept();
        let summary = engine.poll(&mut transport, &board.clock);
        if summary.served == 0 {
            board.clock.delay_ms(config.idle_delay_ms);
        }
    }
}
