//! Integration tests: registering rules through the engine.

use std::cell::Cell;

use httprpc::config::{MAX_FUNCTIONS, MAX_RULES, RouterConfig};
use httprpc::error::RegistrationError;
use httprpc::rpc::engine::{Exchange, RpcEngine};
use httprpc::rpc::response::StatusCode;
use httprpc::rpc::rules::{RpcResult, rpc_result};

use crate::mock_transport::{FakeClock, ScriptedTransport, parse_response};

/// Two independent devices behind one router.
struct Counter {
    name: &'static str,
    hits: Cell<u32>,
}

fn hit(c: &&Counter, _: &str) -> RpcResult {
    c.hits.set(c.hits.get() + 1);
    rpc_result(c.name)
}

fn get(uri: &str) -> String {
    format!("GET {uri} HTTP/1.1\r\n\r\n")
}

#[test]
fn each_class_gets_its_own_context() {
    let pump = Counter { name: "pump", hits: Cell::new(0) };
    let fan = Counter { name: "fan", hits: Cell::new(0) };

    let mut engine: RpcEngine<'_, &Counter> = RpcEngine::new(RouterConfig::default());
    engine.add_rule(&pump, "PUMP", "kick", &hit).unwrap();
    engine.add_rule(&fan, "FAN", "kick", &hit).unwrap();

    let clock = FakeClock::new();
    let mut t = ScriptedTransport::new();
    t.send(0, &get("/FAN%20kick"));
    engine.poll(&mut t, &clock);

    assert_eq!(parse_response(&t.output(0)).json()["result"], "fan");
    assert_eq!(fan.hits.get(), 1);
    assert_eq!(pump.hits.get(), 0);
}

#[test]
fn extra_class_rejected_and_existing_rules_still_serve() {
    let dev = Counter { name: "dev", hits: Cell::new(0) };
    let mut engine: RpcEngine<'_, &Counter> = RpcEngine::new(RouterConfig::default());

    let classes: Vec<String> = (0..=MAX_RULES).map(|i| format!("C{i}")).collect();
    for class in &classes[..MAX_RULES] {
        engine.add_rule(&dev, class, "go", &hit).unwrap();
    }
    assert_eq!(
        engine.add_rule(&dev, &classes[MAX_RULES], "go", &hit),
        Err(RegistrationError::RuleTableFull)
    );
    assert_eq!(engine.rules().len(), MAX_RULES);

    let clock = FakeClock::new();
    for class in &classes[..MAX_RULES] {
        let mut t = ScriptedTransport::new();
        t.send(0, &get(&format!("/{class}%20go")));
        assert_eq!(
            engine.serve_peer(0, &mut t, &clock),
            Exchange::Responded(StatusCode::Ok)
        );
    }

    let mut t = ScriptedTransport::new();
    t.send(0, &get(&format!("/{}%20go", classes[MAX_RULES])));
    assert_eq!(
        engine.serve_peer(0, &mut t, &clock),
        Exchange::Responded(StatusCode::BadRequest)
    );
    assert_eq!(dev.hits.get(), MAX_RULES as u32);
}

#[test]
fn function_capacity_and_duplicates() {
    let dev = Counter { name: "dev", hits: Cell::new(0) };
    let mut engine: RpcEngine<'_, &Counter> = RpcEngine::new(RouterConfig::default());

    for i in 0..MAX_FUNCTIONS {
        engine.add_rule(&dev, "LED", &format!("f{i}"), &hit).unwrap();
    }
    assert_eq!(
        engine.add_rule(&dev, "LED", "f0", &hit),
        Err(RegistrationError::DuplicateRule)
    );
    assert_eq!(
        engine.add_rule(&dev, "LED", "extra", &hit),
        Err(RegistrationError::FunctionListFull)
    );
    assert_eq!(engine.rules().entries().count(), MAX_FUNCTIONS);
}

#[test]
fn closure_callbacks_register() {
    let total = Cell::new(0u32);
    let add = |ctx: &&Cell<u32>, args: &str| {
        let n: u32 = args.split(' ').filter_map(|a| a.parse::<u32>().ok()).sum();
        ctx.set(ctx.get() + n);
        rpc_result("0")
    };

    let mut engine: RpcEngine<'_, &Cell<u32>> = RpcEngine::new(RouterConfig::default());
    engine.add_rule(&total, "SUM", "add", &add).unwrap();

    let mut t = ScriptedTransport::new();
    t.send(0, &get("/SUM%20add%201%202%203"));
    engine.poll(&mut t, &FakeClock::new());

    assert_eq!(parse_response(&t.output(0)).code, 200);
    assert_eq!(total.get(), 6);
}
