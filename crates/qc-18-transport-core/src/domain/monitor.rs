//! Monitoring and address-resolution types.
//!
//! Reference: SPEC_FULL.md Section 3 (MonitoringSubscription,
//! PluginMonitorAddress, SessionInfo, PeerState, ValidationState) and
//! Section 4.6.

use crate::domain::address::Address;
use crate::domain::client::ClientId;
use crate::domain::identity::PeerIdentity;

/// A client's subscription to one of the three monitor streams (Section
/// 3). `filter_peer` being the wildcard identity means "all peers".
#[derive(Debug, Clone, Copy)]
pub struct MonitoringSubscription {
    pub client: ClientId,
    pub filter_peer: PeerIdentity,
}

impl MonitoringSubscription {
    pub fn new(client: ClientId, filter_peer: PeerIdentity) -> Self {
        Self { client, filter_peer }
    }

    pub fn matches(&self, peer: PeerIdentity) -> bool {
        self.filter_peer.is_wildcard() || self.filter_peer == peer
    }
}

/// Neighbour state machine values the core forwards opaquely; transitions
/// live in the (out-of-scope) neighbour facade (Section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    NotConnected,
    ConnectSent,
    ConnectRecv,
    ReconnectAts,
    ReconnectSent,
    Connected,
    Disconnect,
    DisconnectFinished,
}

/// Address-probing state, forwarded opaquely from the validation
/// subsystem (Section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Probing,
    Validated,
    Expired,
    Timeout,
}

/// Lifecycle state of one plugin session, reported via
/// `MONITOR_PLUGIN_SESSION`-style events (Section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Handshake,
    Up,
    Update,
    Done,
}

/// Whether a session's inbound-ness is known at the time the event is
/// raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKnown {
    Yes,
    No,
    Unknown,
}

/// Event describing a plugin session's current state (Section 3).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub address: Address,
    pub state: SessionState,
    pub is_inbound: InboundKnown,
    pub num_msg_pending: u32,
    pub num_bytes_pending: u32,
    /// Absolute time (ms since epoch) receive is paused until.
    pub receive_delay: u64,
    /// Absolute time (ms since epoch) the session expires.
    pub session_timeout: u64,
}

/// Per-session resolution context for `ADDRESS_TO_STRING`-triggered
/// plugin monitor printing (Section 3): defers printing a buffered
/// [`SessionInfo`] event until the address has a resolved string.
#[derive(Debug, Clone, Default)]
pub struct PluginMonitorAddress {
    pub pending_job: bool,
    pub resolved_string: Option<String>,
    pub buffered_event: Option<SessionInfoSnapshot>,
}

/// A [`SessionInfo`] plus the owning peer, stored without re-borrowing the
/// address (it is cloned once into the context).
#[derive(Debug, Clone)]
pub struct SessionInfoSnapshot {
    pub peer: PeerIdentity,
    pub info: SessionInfo,
}
