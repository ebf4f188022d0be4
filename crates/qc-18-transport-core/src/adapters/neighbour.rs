//! Reference `NeighbourFacade` adapter.
//!
//! This is not a real neighbour-selection or ATS engine (Section 2 keeps
//! that subsystem out of scope) — it is a minimal in-memory stand-in
//! good enough to drive the core's own tests and a bare-bones binary,
//! mirroring the "InMemory* adapter as a reference double" pattern used
//! throughout the pack (e.g. `qc-01-peer-discovery`'s
//! `InMemoryEventPublisher`).

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::identity::PeerIdentity;
use crate::ports::outbound::{NeighbourFacade, SendOutcome};

#[derive(Debug, Default)]
pub struct InMemoryNeighbours {
    connected: HashSet<PeerIdentity>,
}

impl InMemoryNeighbours {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/demo hook: mark a peer as connected without going through
    /// `try_connect`.
    pub fn mark_connected(&mut self, peer: PeerIdentity) {
        self.connected.insert(peer);
    }
}

#[async_trait(?Send)]
impl NeighbourFacade for InMemoryNeighbours {
    fn is_connected(&self, peer: PeerIdentity) -> bool {
        self.connected.contains(&peer)
    }

    fn try_connect(&mut self, peer: PeerIdentity) {
        self.connected.insert(peer);
    }

    fn force_disconnect(&mut self, peer: PeerIdentity) {
        self.connected.remove(&peer);
    }

    fn connected_peers(&self) -> Vec<PeerIdentity> {
        self.connected.iter().copied().collect()
    }

    async fn send(&mut self, peer: PeerIdentity, payload: &[u8], _timeout_ms: u64) -> SendOutcome {
        SendOutcome {
            success: self.connected.contains(&peer),
            bytes_physical: payload.len() as u32,
        }
    }
}
