//! Blacklist rule set.
//!
//! Reference: SPEC_FULL.md Section 3 (BlacklistRule) and Section 4.4.

use crate::domain::identity::PeerIdentity;

/// A static veto rule. `transport_name` empty means "all transports for
/// this peer" (Section 3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlacklistRule {
    pub peer: PeerIdentity,
    pub transport_name: String,
}

impl BlacklistRule {
    pub fn peer_wide(peer: PeerIdentity) -> Self {
        Self {
            peer,
            transport_name: String::new(),
        }
    }

    pub fn for_transport(peer: PeerIdentity, transport_name: impl Into<String>) -> Self {
        Self {
            peer,
            transport_name: transport_name.into(),
        }
    }

    pub fn matches(&self, peer: PeerIdentity, transport_name: &str) -> bool {
        self.peer == peer && (self.transport_name.is_empty() || self.transport_name == transport_name)
    }
}
