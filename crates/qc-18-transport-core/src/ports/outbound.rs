//! Driven ports: capabilities the transport core consumes from its
//! collaborators.
//!
//! Reference: SPEC_FULL.md Section 4.5 (plugin interface), Section 4.1
//! (neighbour facade), and the `[AMBIENT]` config/time/client-transport
//! additions.

use async_trait::async_trait;

use crate::domain::address::{Address, SessionId};
use crate::domain::ats::NetworkType;
use crate::domain::client::ClientId;
use crate::domain::config::TransportConfig;
use crate::domain::identity::PeerIdentity;

/// Result of asking a plugin to send bytes over a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    pub success: bool,
    pub bytes_physical: u32,
}

/// Result of an address-pretty-printer callback (Section 4.5).
///
/// `Intermediate` may be followed by more callbacks (including after a
/// `TransientError`); `Done` always terminates the stream.
#[derive(Debug, Clone)]
pub enum PrettyPrintEvent {
    Intermediate(String),
    TransientError,
    Done,
}

/// The capability set the core consumes from each wire-transport plugin
/// (Section 4.5). The core never looks inside `address` bytes; it only
/// forwards them.
#[async_trait(?Send)]
pub trait TransportPlugin {
    /// Short ASCII name, e.g. "tcp".
    fn name(&self) -> &str;

    async fn send(&self, session: SessionId, payload: &[u8]) -> SendOutcome;

    async fn disconnect_session(&self, session: SessionId);

    /// Network category for a session, used by `ats::add_address`.
    fn get_network(&self, session: SessionId) -> NetworkType;

    /// Whether the given address/local-info combination is supported by
    /// this plugin's transport.
    fn check_option(&self, address: &Address) -> bool;

    /// Render `address` as zero or more human-readable strings. Each
    /// element of the returned vector corresponds to one callback
    /// invocation in the original event-driven interface, in order,
    /// terminated implicitly by `PrettyPrintEvent::Done`.
    async fn address_pretty_printer(
        &self,
        address: &Address,
        numeric_only: bool,
    ) -> Vec<PrettyPrintEvent>;
}

/// The contract the core assumes from the neighbour subsystem (Section
/// 2's component 5). Specified only as an interface; no neighbour
/// selection logic lives in this crate.
#[async_trait(?Send)]
pub trait NeighbourFacade {
    fn is_connected(&self, peer: PeerIdentity) -> bool;

    /// Request a connection attempt be made to `peer`. Corresponds to
    /// `REQUEST_CONNECT{connect=1}` after a blacklist check succeeds.
    fn try_connect(&mut self, peer: PeerIdentity);

    /// Force an existing connection down. Corresponds to
    /// `REQUEST_CONNECT{connect=0}`.
    fn force_disconnect(&mut self, peer: PeerIdentity);

    /// Enumerate currently connected peers, used for `START`'s initial
    /// `CONNECT` burst and for peer/validation monitor snapshots.
    fn connected_peers(&self) -> Vec<PeerIdentity>;

    /// Hand a payload off to the neighbour subsystem for delivery,
    /// selecting an address/session via ATS internally. Returns whether
    /// the send ultimately succeeded within `timeout_ms`.
    async fn send(&mut self, peer: PeerIdentity, payload: &[u8], timeout_ms: u64) -> SendOutcome;
}

/// Source of the current time, abstracted so manipulation-delay and
/// timeout tests can use a fixed clock (Section 5's `[AMBIENT]` test
/// tooling).
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

/// Reads the recognised configuration keys (Section 6). The default
/// TOML-backed adapter lives behind the `config` feature
/// (`crate::adapters::config_toml`).
pub trait ConfigProvider {
    fn load(&self) -> TransportConfig;
}

/// The write side of a client's socket: delivers an already-encoded
/// frame. Implemented by whatever owns the actual socket (a TCP/Unix
/// listener adapter, or an in-memory test double).
#[async_trait(?Send)]
pub trait ClientTransport {
    async fn write_frame(&mut self, client: ClientId, frame: &[u8]);

    /// Tear down the underlying connection, e.g. after a protocol
    /// violation (Section 4.1's disconnect-on-malformed-frame policy).
    async fn disconnect(&mut self, client: ClientId);
}
