//! Transport-agnostic HTTP/RPC router.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌──────────┐               │
//! │  │ Transport │──▶│  Codec   │──▶│ Request  │               │
//! │  │ (trait)   │   │ (lines)  │   │ (parse)  │               │
//! │  └───────────┘   └──────────┘   └────┬─────┘               │
//! │       ▲                              ▼                     │
//! │       │          ┌──────────┐   ┌──────────┐   ┌────────┐  │
//! │       └──────────│ Response │◀──│  Engine  │──▶│  URI   │  │
//! │                  │ (build)  │   │(dispatch)│   │ match  │  │
//! │                  └──────────┘   └──────────┘   └───┬────┘  │
//! │                                                    ▼       │
//! │                                               RuleTable    │
//! │                                               → callback   │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod codec;
pub mod engine;
pub mod request;
pub mod response;
pub mod rules;
pub mod session;
pub mod transport;
pub mod uri;
