//! ATS address-registry operations.
//!
//! Reference: SPEC_FULL.md Section 4.2.

use crate::domain::address::{Address, SessionId};
use crate::domain::ats::{AddressRecord, AtsHandle, AtsProperties, NetworkType};
use crate::domain::errors::AtsError;
use crate::domain::identity::PeerIdentity;

use super::core::TransportService;

impl TransportService {
    /// Whether any address record is already known for `address.peer`
    /// carrying the identical transport name and bytes (Section 4.2's
    /// idempotency rule for `add_address`).
    pub fn is_known(&self, address: &Address) -> bool {
        self.addresses
            .get(&address.peer)
            .map(|records| records.iter().any(|r| r.address == *address))
            .unwrap_or(false)
    }

    /// Register a new address, rejecting duplicates and addresses that
    /// violate the inbound/session invariant (Section 3, Section 4.2).
    pub fn add_address(
        &mut self,
        address: Address,
        session: Option<SessionId>,
        network: NetworkType,
    ) -> Result<AtsHandle, AtsError> {
        if address.transport_name.is_empty() {
            return Err(AtsError::EmptyTransportName);
        }
        if matches!(network, NetworkType::Unspecified) {
            return Err(AtsError::UnspecifiedNetwork);
        }
        if self.is_known(&address) {
            return Err(AtsError::AlreadyKnown { peer: address.peer });
        }
        if address.is_inbound() && session.is_none() {
            return Err(AtsError::InboundRequiresSession);
        }

        let handle = self.fresh_ats_handle();
        let peer = address.peer;
        let record = AddressRecord::new(address, session, handle);
        self.addresses.entry(peer).or_default().push(record);
        Ok(handle)
    }

    /// Attach a freshly opened session to an already-known address
    /// (Section 4.2: plugins open sessions independently of
    /// registration).
    pub fn new_session(
        &mut self,
        peer: PeerIdentity,
        ats_handle: AtsHandle,
        session: SessionId,
    ) -> Result<(), AtsError> {
        let record = self.record_mut(peer, ats_handle)?;
        record.session = Some(session);
        Ok(())
    }

    /// Clear a session from its address record. Rejects inbound records,
    /// which must be expired instead of left session-less (Section 3's
    /// invariant).
    pub fn del_session(&mut self, peer: PeerIdentity, ats_handle: AtsHandle) -> Result<(), AtsError> {
        let record = self.record_mut(peer, ats_handle)?;
        if record.address.is_inbound() {
            return Err(AtsError::InboundRequiresSession);
        }
        record.session = None;
        Ok(())
    }

    /// Remove an address record entirely. Refuses to drop a record that
    /// still has a live session (Section 4.2: the plugin must close the
    /// session first).
    pub fn expire_address(&mut self, peer: PeerIdentity, ats_handle: AtsHandle) -> Result<(), AtsError> {
        let records = self
            .addresses
            .get_mut(&peer)
            .ok_or(AtsError::NotFound { peer })?;
        let idx = records
            .iter()
            .position(|r| r.ats_handle == ats_handle)
            .ok_or(AtsError::NotFound { peer })?;
        if records[idx].session.is_some() {
            return Err(AtsError::SessionStillLive);
        }
        records.remove(idx);
        if records.is_empty() {
            self.addresses.remove(&peer);
        }
        Ok(())
    }

    /// Properties currently in effect for `peer`, with any manipulation
    /// overlay (Section 4.3) taking precedence over plugin-reported
    /// values (Section 4.2's "manipulation wins" rule).
    pub fn effective_properties(&self, peer: PeerIdentity) -> AtsProperties {
        if let Some(overlay) = self.manipulation.get(&peer) {
            if let Some(props) = &overlay.synthetic_properties {
                return props.clone();
            }
        }
        if let Some(global) = self.manipulation.get(&PeerIdentity::wildcard()) {
            if let Some(props) = &global.synthetic_properties {
                return props.clone();
            }
        }
        Vec::new()
    }

    fn record_mut(
        &mut self,
        peer: PeerIdentity,
        ats_handle: AtsHandle,
    ) -> Result<&mut AddressRecord, AtsError> {
        self.addresses
            .get_mut(&peer)
            .and_then(|records| records.iter_mut().find(|r| r.ats_handle == ats_handle))
            .ok_or(AtsError::NotFound { peer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedTimeSource;
    use crate::adapters::neighbour::InMemoryNeighbours;
    use crate::domain::config::TransportConfig;

    fn service() -> TransportService {
        TransportService::new(
            PeerIdentity::wildcard(),
            Box::new(InMemoryNeighbours::new()),
            Box::new(FixedTimeSource::new(0)),
            TransportConfig::default(),
        )
    }

    fn addr(peer: PeerIdentity, inbound: bool) -> Address {
        Address::new(
            peer,
            "tcp",
            vec![1, 2, 3],
            if inbound { crate::domain::address::local_info::INBOUND } else { 0 },
        )
    }

    #[test]
    fn add_address_rejects_duplicate() {
        let mut svc = service();
        let peer = PeerIdentity::new([1u8; 32]);
        svc.add_address(addr(peer, false), None, NetworkType::Wan).unwrap();
        let err = svc
            .add_address(addr(peer, false), None, NetworkType::Wan)
            .unwrap_err();
        assert!(matches!(err, AtsError::AlreadyKnown { .. }));
    }

    #[test]
    fn add_address_rejects_inbound_without_session() {
        let mut svc = service();
        let peer = PeerIdentity::new([2u8; 32]);
        let err = svc
            .add_address(addr(peer, true), None, NetworkType::Wan)
            .unwrap_err();
        assert!(matches!(err, AtsError::InboundRequiresSession));
    }

    #[test]
    fn add_address_rejects_unspecified_network() {
        let mut svc = service();
        let peer = PeerIdentity::new([3u8; 32]);
        let err = svc
            .add_address(addr(peer, false), None, NetworkType::Unspecified)
            .unwrap_err();
        assert!(matches!(err, AtsError::UnspecifiedNetwork));
    }

    #[test]
    fn expire_refuses_live_session() {
        let mut svc = service();
        let peer = PeerIdentity::new([4u8; 32]);
        let handle = svc
            .add_address(addr(peer, true), Some(SessionId::new(1)), NetworkType::Wan)
            .unwrap();
        let err = svc.expire_address(peer, handle).unwrap_err();
        assert!(matches!(err, AtsError::SessionStillLive));
    }

    #[test]
    fn del_session_then_expire_succeeds_for_outbound() {
        let mut svc = service();
        let peer = PeerIdentity::new([5u8; 32]);
        let handle = svc
            .add_address(addr(peer, false), Some(SessionId::new(2)), NetworkType::Wan)
            .unwrap();
        svc.del_session(peer, handle).unwrap();
        svc.expire_address(peer, handle).unwrap();
        assert!(!svc.is_known(&addr(peer, false)));
    }
}
