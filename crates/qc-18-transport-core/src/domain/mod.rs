//! Domain layer: pure types and invariants for the transport core.
//!
//! Reference: SPEC_FULL.md Section 3.

pub mod address;
pub mod ats;
pub mod blacklist;
pub mod client;
pub mod config;
pub mod errors;
pub mod identity;
pub mod manipulation;
pub mod monitor;

pub use address::{local_info, Address, SessionId};
pub use ats::{AddressRecord, AtsHandle, AtsProperties, AtsProperty, NetworkType};
pub use blacklist::BlacklistRule;
pub use client::{ClientConnection, ClientId, OutboundFrame, MAX_PENDING};
pub use config::TransportConfig;
pub use errors::{AtsError, BlacklistError, ClientProtocolError, TransportError};
pub use identity::PeerIdentity;
pub use manipulation::{DelayQueueEntry, ManipulationPeer, SendContinuation};
pub use monitor::{
    InboundKnown, MonitoringSubscription, PeerState, PluginMonitorAddress, SessionInfo,
    SessionInfoSnapshot, SessionState, ValidationState,
};
