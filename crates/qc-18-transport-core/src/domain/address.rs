//! Address and session primitives.
//!
//! Reference: SPEC_FULL.md Section 3 (Address, Session).

use crate::domain::identity::PeerIdentity;

/// Bit flags carried alongside an [`Address`].
///
/// Only `INBOUND` is defined by the spec; the type is a plain `u32` bitset
/// (rather than an enum) so plugins can carry forward bits the core does
/// not interpret.
pub mod local_info {
    /// The address was learned because the peer connected to us, as
    /// opposed to an address we dialed ourselves.
    pub const INBOUND: u32 = 0x1;
}

/// A plugin-specific routable location for a peer.
///
/// Opaque to the core beyond the fields needed for bookkeeping: the
/// `address` bytes themselves are never interpreted here, only compared
/// and handed back to the owning plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub peer: PeerIdentity,
    /// Short ASCII name of the transport plugin, e.g. "tcp", "udp".
    pub transport_name: String,
    /// Opaque, plugin-specific address bytes.
    pub address: Vec<u8>,
    pub local_info: u32,
}

impl Address {
    pub fn new(
        peer: PeerIdentity,
        transport_name: impl Into<String>,
        address: Vec<u8>,
        local_info: u32,
    ) -> Self {
        Self {
            peer,
            transport_name: transport_name.into(),
            address,
            local_info,
        }
    }

    pub fn is_inbound(&self) -> bool {
        self.local_info & local_info::INBOUND != 0
    }
}

/// A plugin-owned opaque handle for a live conversation over one address.
///
/// `None` means the address is known but no channel is currently open;
/// inbound addresses require `Some` throughout their lifetime (see
/// [`crate::domain::ats::AddressRecord`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(local_info: u32) -> Address {
        Address::new(PeerIdentity::wildcard(), "tcp", vec![1, 2, 3], local_info)
    }

    #[test]
    fn inbound_flag_is_read_correctly() {
        assert!(!addr(0).is_inbound());
        assert!(addr(local_info::INBOUND).is_inbound());
    }

    #[test]
    fn addresses_compare_by_all_fields() {
        let a = addr(0);
        let mut b = addr(0);
        b.address.push(4);
        assert_ne!(a, b);
    }
}
