//! Driving port: the client-facing API the transport core exposes.
//!
//! Reference: SPEC_FULL.md Section 4.1. `TransportService` (in
//! `crate::service`) is the sole implementor; the trait exists so tests
//! and downstream wiring can depend on the capability set rather than on
//! the concrete service type, matching `qc-01-peer-discovery`'s
//! `PeerDiscoveryApi` port.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::address::Address;
use crate::domain::client::ClientId;
use crate::domain::errors::TransportError;
use crate::domain::identity::PeerIdentity;
use crate::domain::monitor::{PeerState, ValidationState};

/// One row of a `MONITOR_PEER_REQUEST` snapshot/stream (Section 4.1).
#[derive(Debug, Clone)]
pub struct PeerMonitorEvent {
    pub peer: PeerIdentity,
    pub address: Option<Address>,
    pub state: PeerState,
    pub state_timeout_ms: u64,
}

/// One row of a `MONITOR_VALIDATION_REQUEST` snapshot/stream.
#[derive(Debug, Clone)]
pub struct ValidationMonitorEvent {
    pub peer: PeerIdentity,
    pub address: Address,
    pub last_validation_ms: u64,
    pub valid_until_ms: u64,
    pub next_validation_ms: u64,
    pub state: ValidationState,
}

/// Outcome of a `SEND` request, mirrored into the `SEND_OK` wire frame.
#[derive(Debug, Clone, Copy)]
pub struct SendResult {
    pub success: bool,
    pub bytes_msg: u32,
    pub bytes_physical: u32,
    pub latency_ms: u64,
}

/// The primary API a local client drives, one method per recognised
/// inbound message from Section 6's framing table.
#[async_trait(?Send)]
pub trait TransportApi {
    /// Handle a client's `START`. `claimed_self` is only checked when
    /// `check_self` is set.
    fn start(
        &mut self,
        client: ClientId,
        check_self: bool,
        claimed_self: PeerIdentity,
        wants_payload: bool,
    ) -> Result<(), TransportError>;

    /// Hand a HELLO blob to the (out-of-scope) validation subsystem.
    /// Always succeeds from the client's point of view (Section 4.1).
    fn hello(&mut self, client: ClientId, hello_bytes: &[u8]);

    /// Queue a payload send to `target`, subject to manipulation delay.
    /// The eventual result reaches the client asynchronously as
    /// `SEND_OK`; this call only validates preconditions and enqueues.
    fn send_payload(
        &mut self,
        client: ClientId,
        target: PeerIdentity,
        timeout_ms: u64,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// `connect = true` consults the blacklist arbiter before dialing
    /// (Section 4.4); the receiver resolves once that decision is known,
    /// which may be turns later if it depends on a decider client's
    /// `BLACKLIST_REPLY` -- callers must resolve it non-blockingly (e.g.
    /// `Scheduler`'s stash-and-poll) rather than awaiting it inline, or
    /// risk deadlocking the single-threaded event loop (Section 5).
    /// `connect = false` force-disconnects immediately without consulting
    /// the blacklist (Open Question resolved in SPEC_FULL.md Section 9)
    /// and so never needs one.
    fn request_connect(
        &mut self,
        client: ClientId,
        peer: PeerIdentity,
        connect: bool,
    ) -> Option<oneshot::Receiver<bool>>;

    /// Emits a `MONITOR_PEER_RESPONSE` frame per currently matching
    /// neighbour, followed by a zero-length terminator if `one_shot`
    /// (Section 4.1, Testable Property 6). A duplicate non-one-shot
    /// registration from the same client is an error.
    fn monitor_peer_request(
        &mut self,
        client: ClientId,
        filter_peer: PeerIdentity,
        one_shot: bool,
    ) -> Result<Vec<PeerMonitorEvent>, TransportError>;

    fn monitor_validation_request(
        &mut self,
        client: ClientId,
        filter_peer: PeerIdentity,
        one_shot: bool,
    ) -> Result<Vec<ValidationMonitorEvent>, TransportError>;

    fn blacklist_init(&mut self, client: ClientId);

    fn blacklist_reply(&mut self, client: ClientId, peer: PeerIdentity, is_allowed: bool);

    fn traffic_metric(
        &mut self,
        peer: PeerIdentity,
        delay_in_ms: u64,
        delay_out_ms: u64,
        properties: crate::domain::ats::AtsProperties,
    );

    /// Render `address_bytes` as zero or more human-readable strings via
    /// the named plugin's pretty-printer, streaming one
    /// `ADDRESS_TO_STRING_REPLY` frame per result and finishing with a
    /// `res = OK, len = 0` terminator (Section 4.1, Section 4.6). An
    /// unknown plugin name gets a `SYSERR` frame immediately followed by
    /// the terminator.
    async fn address_to_string(
        &mut self,
        client: ClientId,
        plugin_name: String,
        address_bytes: Vec<u8>,
        numeric_only: bool,
        timeout_ms: u64,
    );

    /// Tear down all state associated with a client (Section 4.1 and
    /// Section 5's cancellation rules).
    fn client_disconnected(&mut self, client: ClientId);
}
