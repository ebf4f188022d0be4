//! ATS (address-selection) bookkeeping types.
//!
//! Reference: SPEC_FULL.md Section 3 (AddressRecord) and Section 4.2.

use crate::domain::address::Address;
use crate::domain::identity::PeerIdentity;

/// Opaque handle into the (simulated, in-crate) address-selection service.
///
/// The real ATS subsystem is out of scope (Section 1); this crate owns a
/// small arena (see `service::ats::AtsArena`) that stands in for it so the
/// registry's handle-lifecycle invariants can still be implemented and
/// tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtsHandle(pub u64);

/// Network category a plugin reports for a session, mirrored into the
/// `NETWORK_TYPE` property prepended by `add_address` (Section 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Loopback,
    Lan,
    Wan,
    Wlan,
    Bluetooth,
    /// The plugin could not classify the session; `add_address` rejects
    /// the address when this is returned.
    Unspecified,
}

/// A single address-quality property, as reported by a plugin or
/// overridden by the manipulation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtsProperty {
    NetworkType(NetworkType),
    DistanceHops(u32),
    /// Estimated round-trip delay, in milliseconds.
    DelayMs(u32),
    /// Estimated throughput, in bytes/second.
    ThroughputBytesPerSec(u32),
}

/// An ordered set of ATS properties attached to an address/session.
pub type AtsProperties = Vec<AtsProperty>;

/// Core-owned binding between an [`Address`], its current [`SessionId`]
/// (if any), and the opaque ATS handle mirroring it externally.
///
/// [`SessionId`]: crate::domain::address::SessionId
#[derive(Debug, Clone)]
pub struct AddressRecord {
    pub address: Address,
    pub session: Option<crate::domain::address::SessionId>,
    pub ats_handle: AtsHandle,
}

impl AddressRecord {
    pub fn new(
        address: Address,
        session: Option<crate::domain::address::SessionId>,
        ats_handle: AtsHandle,
    ) -> Self {
        Self {
            address,
            session,
            ats_handle,
        }
    }

    /// Per Section 3's invariant: an inbound record always has a live
    /// session.
    pub fn upholds_inbound_invariant(&self) -> bool {
        !self.address.is_inbound() || self.session.is_some()
    }

    pub fn peer(&self) -> PeerIdentity {
        self.address.peer
    }
}
