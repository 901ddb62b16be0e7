//! httprpc: embedded HTTP/RPC command router.
//!
//! Maps `GET /<class>%20<function>%20<arg>…` requests onto callbacks
//! registered at startup and answers with a small JSON envelope.
//!
//! The router core (`rpc`) only talks to the outside world through the
//! [`PeerTransport`](rpc::transport::PeerTransport) and
//! [`Clock`](rpc::clock::Clock) traits; `adapters` provides host
//! implementations of both, and `drivers` holds the RGB LED demo device.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod rpc;

pub mod adapters;
pub mod drivers;
