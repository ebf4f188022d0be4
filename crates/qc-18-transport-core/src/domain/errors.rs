//! Error types for the transport core.
//!
//! Most failures described by the spec are handled by logging and
//! continuing (see SPEC_FULL.md Section 7); these enums cover the
//! minority of operations that report failure synchronously to their
//! caller.

use thiserror::Error;

use crate::domain::address::Address;
use crate::domain::identity::PeerIdentity;

/// Failures from the ATS address registry (Section 4.2).
#[derive(Debug, Clone, Error)]
pub enum AtsError {
    #[error("address already known for peer {peer}")]
    AlreadyKnown { peer: PeerIdentity },

    #[error("address has empty transport name")]
    EmptyTransportName,

    #[error("inbound address requires a non-null session")]
    InboundRequiresSession,

    #[error("plugin reported an unspecified network type, address rejected")]
    UnspecifiedNetwork,

    #[error("no matching address record for peer {peer}")]
    NotFound { peer: PeerIdentity },

    #[error("session mismatch: record does not carry the given session")]
    SessionMismatch,

    #[error("cannot expire an address record that still has a live session")]
    SessionStillLive,
}

/// Failures reported when parsing or handling a client-originated frame.
///
/// Any variant here results in the client being disconnected (Section
/// 4.1's "malformed frame" failure policy); the enum exists for logging,
/// not for retry.
#[derive(Debug, Clone, Error)]
pub enum ClientProtocolError {
    #[error("frame too short: need at least {need} bytes, got {got}")]
    FrameTooShort { need: usize, got: usize },

    #[error("frame length {declared} does not match body length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown message type {0:#06x}")]
    UnknownMessageType(u16),

    #[error("client sent START more than once")]
    DuplicateStart,

    #[error("client sent a message before START")]
    StartNotYetSent,

    #[error("claimed self-identity does not match ours")]
    SelfMismatch,

    #[error("invalid REQUEST_CONNECT.connect value {0}")]
    InvalidConnectFlag(u32),

    #[error("address_to_string plugin name was not nul-terminated")]
    UnterminatedPluginName,

    #[error("payload shorter than the minimum header size")]
    PayloadTooShort,

    #[error("client already has a peer or validation monitor registered")]
    DuplicateMonitorRegistration,

    #[error("message type {0:#06x} is only ever sent service-to-client")]
    UnexpectedDirection(u16),
}

/// Failures from the blacklist arbiter (Section 4.4).
#[derive(Debug, Clone, Error)]
pub enum BlacklistError {
    #[error("no blacklist query outstanding for peer {peer}")]
    NoOutstandingQuery { peer: PeerIdentity },
}

/// Umbrella error for the crate's public API surface.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Ats(#[from] AtsError),
    #[error(transparent)]
    ClientProtocol(#[from] ClientProtocolError),
    #[error(transparent)]
    Blacklist(#[from] BlacklistError),
    #[error("address pretty-printer plugin {0:?} not found")]
    UnknownPlugin(String),
}

/// Helper used by add_address to report which address failed.
#[derive(Debug, Clone)]
pub struct AddressRejected {
    pub address: Address,
    pub reason: AtsError,
}
