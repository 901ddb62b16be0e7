//! RPC engine: serves one request per connected peer per poll pass.
//!
//! **Transport-decoupled**: the engine owns the rule table and the per-peer
//! staging buffers, but borrows the transport and clock for each pass.
//!
//! Each peer's turn walks a fixed state sequence:
//!
//! ```text
//!  Idle ─▶ AwaitingRequestLine ─▶ HeaderLine ─▶ SkippingHeaders ─┬─▶ Dispatching ─▶ Responding ─▶ Idle
//!              │ timeout                                         │ non-GET / error      ▲
//!              ▼                                                 └──────────────────────┘
//!             Idle (retried next poll)
//! ```
//!
//! The turn always runs to completion before the next peer is visited. The
//! line reader may hold the thread for up to `request_timeout_ms` per line
//! while it waits on that peer. Whatever the outcome, the peer's
//! [`PendingRequest`](super::session::PendingRequest) is cleared before the
//! turn ends, so nothing carries over into the next exchange.

use log::{debug, error, info, warn};

use super::clock::Clock;
use super::codec::{LineStatus, read_line};
use super::request::{Method, Version, parse_request_bytes};
use super::response::{Response, StatusCode};
use super::rules::{RpcCallback, RuleTable};
use super::session::{MAX_PEERS, PeerId, PendingRequest, PendingTable};
use super::transport::PeerTransport;
use crate::config::{ErrorPolicy, RouterConfig};
use crate::error::{Error, RegistrationError, RequestError};

/// Steps of one request exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    AwaitingRequestLine,
    HeaderLine,
    SkippingHeaders,
    Dispatching,
    Responding,
}

/// How a peer's turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// Nothing was read (no data, or a stray blank line).
    Idle,
    /// No request line arrived in time; the peer is retried next poll.
    TimedOut,
    /// A response with this status was written.
    Responded(StatusCode),
    /// The request was abandoned without a reply.
    Dropped(RequestError),
    /// Building or writing the response failed.
    Failed(Error),
}

/// Tally of one [`RpcEngine::poll`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollSummary {
    /// Peers that had data and were served.
    pub served: u8,
    /// Responses written.
    pub responded: u8,
    /// Requests abandoned (dropped, timed out or failed).
    pub abandoned: u8,
}

/// The HTTP/RPC router.
pub struct RpcEngine<'a, C> {
    rules: RuleTable<'a, C>,
    pending: PendingTable,
    config: RouterConfig,
}

impl<'a, C> RpcEngine<'a, C> {
    pub fn new(config: RouterConfig) -> Self {
        Self::with_rules(RuleTable::new(), config)
    }

    pub fn with_rules(rules: RuleTable<'a, C>, config: RouterConfig) -> Self {
        Self {
            rules,
            pending: PendingTable::new(),
            config,
        }
    }

    /// Register a rule. See [`RuleTable::add_rule`].
    pub fn add_rule(
        &mut self,
        context: C,
        class: &str,
        function: &str,
        callback: &'a dyn RpcCallback<C>,
    ) -> Result<(), RegistrationError> {
        self.rules.add_rule(context, class, function, callback)
    }

    pub fn rules(&self) -> &RuleTable<'a, C> {
        &self.rules
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Staging state of `peer` (empty between exchanges).
    pub fn pending(&self, peer: PeerId) -> Option<&PendingRequest> {
        self.pending.get(peer)
    }

    /// Forget any staged state for `peer` (e.g. on disconnect).
    pub fn reset_peer(&mut self, peer: PeerId) {
        self.pending.reset_peer(peer);
    }

    /// Visit every peer slot once, in order, serving those with data.
    pub fn poll<T, K>(&mut self, transport: &mut T, clock: &K) -> PollSummary
    where
        T: PeerTransport,
        K: Clock,
    {
        let mut summary = PollSummary::default();
        for idx in 0..MAX_PEERS {
            let peer = idx as PeerId;
            if !transport.is_connected(peer) {
                self.pending.reset_peer(peer);
                continue;
            }
            if transport.available(peer) == 0 {
                continue;
            }

            summary.served += 1;
            match self.serve_peer(peer, transport, clock) {
                Exchange::Responded(_) => summary.responded += 1,
                Exchange::Idle => {}
                Exchange::TimedOut | Exchange::Dropped(_) | Exchange::Failed(_) => {
                    summary.abandoned += 1;
                }
            }
        }
        summary
    }

    /// Run one full exchange with `peer`.
    pub fn serve_peer<T, K>(&mut self, peer: PeerId, transport: &mut T, clock: &K) -> Exchange
    where
        T: PeerTransport,
        K: Clock,
    {
        let Some(slot) = self.pending.get_mut(peer) else {
            return Exchange::Idle;
        };
        let timeout_ms = self.config.request_timeout_ms;
        let policy = self.config.error_policy;

        let mut state = ExchangeState::AwaitingRequestLine;
        let mut status = StatusCode::Ok;
        let mut failure: Option<RequestError> = None;
        // Set while the tail of a cut line is still in the transport.
        let mut in_cut_line = false;

        let outcome = loop {
            let next = match state {
                ExchangeState::Idle => break Exchange::Idle,

                ExchangeState::AwaitingRequestLine => {
                    match read_line(transport, clock, peer, &mut slot.line, timeout_ms) {
                        Ok(LineStatus::Line(_)) => ExchangeState::HeaderLine,
                        Ok(LineStatus::Blank) => ExchangeState::Idle,
                        Ok(LineStatus::Truncated(_)) => {
                            warn!("RPC[{}]: request line too long", peer);
                            failure = Some(RequestError::MalformedRequest);
                            in_cut_line = true;
                            ExchangeState::SkippingHeaders
                        }
                        Err(RequestError::Timeout) => {
                            debug!("RPC[{}]: no request line before deadline", peer);
                            break Exchange::TimedOut;
                        }
                        Err(e) => break Exchange::Dropped(e),
                    }
                }

                ExchangeState::HeaderLine => {
                    match parse_request_bytes(&slot.line) {
                        Ok(request) => {
                            debug!(
                                "RPC[{}]: {} {} {}",
                                peer,
                                request.method,
                                request.uri,
                                request.version.as_str()
                            );
                            slot.request = Some(request);
                        }
                        Err(e) => {
                            warn!("RPC[{}]: {}", peer, e);
                            failure = Some(e);
                        }
                    }
                    ExchangeState::SkippingHeaders
                }

                ExchangeState::SkippingHeaders => {
                    match read_line(transport, clock, peer, &mut slot.line, timeout_ms) {
                        Ok(LineStatus::Truncated(_)) => {
                            in_cut_line = true;
                            ExchangeState::SkippingHeaders
                        }
                        Ok(LineStatus::Line(_)) => {
                            in_cut_line = false;
                            ExchangeState::SkippingHeaders
                        }
                        Ok(LineStatus::Blank) if in_cut_line => {
                            in_cut_line = false;
                            ExchangeState::SkippingHeaders
                        }
                        Ok(LineStatus::Blank) => {
                            let method = slot.request.as_ref().map(|r| r.method);
                            match (failure, method) {
                                (Some(e), _) => match reject(e, policy) {
                                    Some(s) => {
                                        status = s;
                                        ExchangeState::Responding
                                    }
                                    None => break Exchange::Dropped(e),
                                },
                                (None, Some(Method::Get)) => ExchangeState::Dispatching,
                                (None, _) => {
                                    debug!("RPC[{}]: method {:?} not served", peer, method);
                                    status = StatusCode::NotFound;
                                    ExchangeState::Responding
                                }
                            }
                        }
                        Err(RequestError::Timeout) => {
                            warn!("RPC[{}]: header block not terminated in time", peer);
                            match failure.map(|e| (e, reject(e, policy))) {
                                Some((e, None)) => break Exchange::Dropped(e),
                                Some((_, Some(s))) => status = s,
                                None => status = StatusCode::NotFound,
                            }
                            ExchangeState::Responding
                        }
                        Err(e) => break Exchange::Dropped(e),
                    }
                }

                ExchangeState::Dispatching => {
                    let uri = slot.request.as_ref().map_or("", |r| r.uri.as_str());
                    let resolved = self.rules.resolve(uri, &mut slot.args).and_then(|route| {
                        if slot.args.len() > self.config.max_args_len {
                            slot.args.clear();
                            Err(RequestError::CommandTooLong)
                        } else {
                            Ok(route)
                        }
                    });
                    match resolved {
                        Ok(route) => {
                            if let Some(result) = self.rules.invoke(route, &slot.args) {
                                slot.result = result;
                            }
                            info!(
                                "RPC[{}]: {} ({}) -> {}",
                                peer,
                                uri,
                                slot.args.trim_end(),
                                slot.result
                            );
                            status = StatusCode::Ok;
                            ExchangeState::Responding
                        }
                        Err(e) => {
                            warn!("RPC[{}]: {}: {}", peer, uri, e);
                            match reject(e, policy) {
                                Some(s) => {
                                    status = s;
                                    ExchangeState::Responding
                                }
                                None => break Exchange::Dropped(e),
                            }
                        }
                    }
                }

                ExchangeState::Responding => break respond(transport, peer, status, slot),
            };

            debug!("RPC[{}]: {:?} -> {:?}", peer, state, next);
            state = next;
        };

        slot.clear();
        outcome
    }
}

/// Status to answer `e` with, or `None` if the policy says stay silent.
fn reject(e: RequestError, policy: ErrorPolicy) -> Option<StatusCode> {
    match (e, policy) {
        (RequestError::MalformedRequest | RequestError::CommandTooLong, ErrorPolicy::Drop) => None,
        _ => Some(e.status_code()),
    }
}

fn respond<T: PeerTransport>(
    transport: &mut T,
    peer: PeerId,
    status: StatusCode,
    slot: &PendingRequest,
) -> Exchange {
    let version = slot
        .request
        .as_ref()
        .map_or(Version::default(), |r| r.version);

    let built = if status == StatusCode::Ok {
        Response::rpc_result(version, &slot.result, peer)
    } else {
        Response::status_only(status, version)
    };

    match built.and_then(|r| r.write_to(transport, peer)) {
        Ok(()) => Exchange::Responded(status),
        Err(e) => {
            error!("RPC[{}]: response not sent: {}", peer, e);
            Exchange::Failed(e)
        }
    }
}
