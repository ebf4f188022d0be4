//! In-memory `TransportPlugin` test double.
//!
//! Records every `send`/`disconnect_session` call instead of touching a
//! real socket, following the "InMemory* test double" convention used
//! for the other driven ports in this crate (see
//! `adapters::neighbour::InMemoryNeighbours`).

#![cfg(feature = "test-utils")]

use std::cell::RefCell;

use async_trait::async_trait;

use crate::domain::address::{Address, SessionId};
use crate::domain::ats::NetworkType;
use crate::ports::outbound::{PrettyPrintEvent, SendOutcome, TransportPlugin};

pub struct InMemoryPlugin {
    name: String,
    network: NetworkType,
    sent: RefCell<Vec<(SessionId, Vec<u8>)>>,
    disconnected: RefCell<Vec<SessionId>>,
}

impl InMemoryPlugin {
    pub fn new(name: impl Into<String>, network: NetworkType) -> Self {
        Self {
            name: name.into(),
            network,
            sent: RefCell::new(Vec::new()),
            disconnected: RefCell::new(Vec::new()),
        }
    }

    pub fn sent_payloads(&self) -> Vec<(SessionId, Vec<u8>)> {
        self.sent.borrow().clone()
    }

    pub fn disconnected_sessions(&self) -> Vec<SessionId> {
        self.disconnected.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TransportPlugin for InMemoryPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, session: SessionId, payload: &[u8]) -> SendOutcome {
        self.sent.borrow_mut().push((session, payload.to_vec()));
        SendOutcome {
            success: true,
            bytes_physical: payload.len() as u32,
        }
    }

    async fn disconnect_session(&self, session: SessionId) {
        self.disconnected.borrow_mut().push(session);
    }

    fn get_network(&self, _session: SessionId) -> NetworkType {
        self.network
    }

    fn check_option(&self, address: &Address) -> bool {
        address.transport_name == self.name
    }

    async fn address_pretty_printer(&self, address: &Address, _numeric_only: bool) -> Vec<PrettyPrintEvent> {
        vec![
            PrettyPrintEvent::Intermediate(format!("{}://{:?}", self.name, address.address)),
            PrettyPrintEvent::Done,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::PeerIdentity;

    #[tokio::test]
    async fn send_records_payload() {
        let plugin = InMemoryPlugin::new("tcp", NetworkType::Wan);
        plugin.send(SessionId::new(1), b"hello").await;
        assert_eq!(plugin.sent_payloads(), vec![(SessionId::new(1), b"hello".to_vec())]);
    }

    #[tokio::test]
    async fn pretty_printer_ends_with_done() {
        let plugin = InMemoryPlugin::new("tcp", NetworkType::Wan);
        let address = Address::new(PeerIdentity::wildcard(), "tcp", vec![1, 2, 3], 0);
        let events = plugin.address_pretty_printer(&address, true).await;
        assert!(matches!(events.last(), Some(PrettyPrintEvent::Done)));
    }
}
