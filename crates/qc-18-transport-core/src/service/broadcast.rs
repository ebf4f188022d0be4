//! Broadcast discipline: fanning service-originated events out to every
//! interested client (Section 4.1 and Section 4.6).

use crate::domain::address::Address;
use crate::domain::identity::PeerIdentity;
use crate::domain::monitor::PeerState;
use crate::ports::outbound::NeighbourFacade;
use crate::wire::ClientMessage;

use super::core::TransportService;

impl TransportService {
    /// Deliver an inbound payload to every client that asked for
    /// payloads in its `START` (Section 4.1: clients that did not set
    /// `wants_payload` only ever see control traffic). Droppable, like
    /// every other payload-bearing frame, under the per-client
    /// backpressure policy.
    pub fn broadcast_payload(&mut self, peer: PeerIdentity, payload: Vec<u8>) {
        let targets: Vec<_> = self
            .clients
            .iter()
            .filter(|(_, conn)| conn.send_payload)
            .map(|(id, _)| *id)
            .collect();
        for client in targets {
            let msg = ClientMessage::Recv {
                peer,
                payload: payload.clone(),
            };
            self.send_to_client(client, &msg, true);
        }
    }

    /// Notify every peer-monitor subscription whose filter matches
    /// `peer` that its connection state changed.
    pub fn broadcast_peer_state(&mut self, peer: PeerIdentity, state: PeerState, address: Option<Address>) {
        let matching: Vec<_> = self
            .peer_monitors
            .iter()
            .filter(|sub| sub.matches(peer))
            .map(|sub| sub.client)
            .collect();

        for client in matching {
            let (address_bytes, plugin_name) = match &address {
                Some(addr) => (addr.address.clone(), addr.transport_name.clone()),
                None => (Vec::new(), String::new()),
            };
            let msg = ClientMessage::MonitorPeerResponse {
                peer,
                local_info: address.as_ref().map(|a| a.local_info).unwrap_or(0),
                state: peer_state_to_wire(state),
                state_timeout_us: 0,
                address: address_bytes,
                plugin_name,
            };
            self.send_to_client(client, &msg, false);
        }
    }

    /// Diff `neighbours.connected_peers()` against the last tick's
    /// snapshot and emit unsolicited `CONNECT`/`DISCONNECT` frames to
    /// every started client for whatever changed (Section 6's wire
    /// table). Unlike [`Self::broadcast_peer_state`], these go to every
    /// client, not just peer-monitor subscribers -- any client sending
    /// payload needs to know a peer connected without first asking to
    /// monitor it.
    pub(crate) fn poll_neighbour_changes(&mut self) {
        let now: std::collections::HashSet<PeerIdentity> =
            self.neighbours.connected_peers().into_iter().collect();

        // First call ever: seed the snapshot without diffing. Any peer
        // already connected at this point was already replayed as a
        // CONNECT burst by `start` for every client started so far; a
        // diff against the default empty `last_connected` here would
        // emit a second CONNECT for the same peer.
        if !self.last_connected_initialized {
            self.last_connected = now;
            self.last_connected_initialized = true;
            return;
        }

        let newly_connected: Vec<PeerIdentity> =
            now.difference(&self.last_connected).copied().collect();
        let newly_disconnected: Vec<PeerIdentity> =
            self.last_connected.difference(&now).copied().collect();

        for peer in newly_connected {
            self.broadcast_connect(peer);
        }
        for peer in newly_disconnected {
            self.broadcast_disconnect(peer);
        }

        self.last_connected = now;
    }

    fn broadcast_connect(&mut self, peer: PeerIdentity) {
        let targets: Vec<_> = self
            .clients
            .iter()
            .filter(|(_, conn)| conn.started)
            .map(|(id, _)| *id)
            .collect();
        for client in targets {
            let msg = ClientMessage::Connect {
                quota_in: 0,
                quota_out: 0,
                peer,
            };
            self.send_to_client(client, &msg, false);
        }
    }

    fn broadcast_disconnect(&mut self, peer: PeerIdentity) {
        let targets: Vec<_> = self
            .clients
            .iter()
            .filter(|(_, conn)| conn.started)
            .map(|(id, _)| *id)
            .collect();
        for client in targets {
            let msg = ClientMessage::Disconnect { peer };
            self.send_to_client(client, &msg, false);
        }

        // Section 4.3: a disconnected peer's manipulation FIFO is drained
        // and every queued send fails its continuation with zero bytes on
        // the wire, rather than leaving the originating client waiting
        // forever for a `SEND_OK` that can now never arrive.
        for (continuation, result) in self.peer_disconnected(peer) {
            let msg = ClientMessage::SendOk {
                success: result.success as u32,
                bytes_msg: result.bytes_msg,
                bytes_physical: result.bytes_physical,
                latency_us: result.latency_ms.saturating_mul(1_000),
                peer: continuation.target,
            };
            self.send_to_client(continuation.client, &msg, false);
        }
    }
}

pub(crate) fn peer_state_to_wire(state: PeerState) -> u32 {
    match state {
        PeerState::NotConnected => 0,
        PeerState::ConnectSent => 1,
        PeerState::ConnectRecv => 2,
        PeerState::ReconnectAts => 3,
        PeerState::ReconnectSent => 4,
        PeerState::Connected => 5,
        PeerState::Disconnect => 6,
        PeerState::DisconnectFinished => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedTimeSource;
    use crate::adapters::neighbour::InMemoryNeighbours;
    use crate::domain::config::TransportConfig;
    use crate::domain::identity::PeerIdentity;

    fn service() -> TransportService {
        TransportService::new(
            PeerIdentity::wildcard(),
            Box::new(InMemoryNeighbours::new()),
            Box::new(FixedTimeSource::new(0)),
            TransportConfig::default(),
        )
    }

    #[test]
    fn payload_only_reaches_clients_that_opted_in() {
        let mut svc = service();
        let wants_it = svc.register_client();
        svc.start(wants_it, false, PeerIdentity::wildcard(), true).unwrap();
        let control_only = svc.register_client();
        svc.start(control_only, false, PeerIdentity::wildcard(), false).unwrap();

        svc.broadcast_payload(PeerIdentity::new([1u8; 32]), vec![9, 9]);

        assert_eq!(svc.clients[&wants_it].queue_len(), 1);
        assert_eq!(svc.clients[&control_only].queue_len(), 0);
    }

    #[test]
    fn cold_start_does_not_double_emit_connect_for_an_already_connected_peer() {
        use crate::ports::inbound::TransportApi;

        let mut svc = service();
        let peer = PeerIdentity::new([8u8; 32]);
        svc.neighbours.try_connect(peer);

        // The peer connects before the first client even starts, so the
        // only CONNECT it should ever see is the one `start` replays.
        let client = svc.register_client();
        svc.start(client, false, PeerIdentity::wildcard(), true).unwrap();
        assert_eq!(svc.clients[&client].queue_len(), 1);

        // The first tick must not diff against the default empty
        // snapshot and re-emit a second CONNECT for the same peer.
        svc.poll_neighbour_changes();
        assert_eq!(svc.clients[&client].queue_len(), 1);
    }

    #[test]
    fn disconnect_drains_manipulation_queue_and_reports_send_failure() {
        use crate::ports::inbound::TransportApi;
        use std::time::Duration;

        let mut svc = service();
        let client = svc.register_client();
        svc.start(client, false, PeerIdentity::wildcard(), true).unwrap();
        // First call only seeds the baseline (Section 4.1's cold-start
        // rule); no peer is connected yet so nothing is broadcast.
        svc.poll_neighbour_changes();

        let peer = PeerIdentity::new([7u8; 32]);
        svc.neighbours.try_connect(peer);
        svc.poll_neighbour_changes();
        assert_eq!(svc.clients[&client].queue_len(), 1); // the CONNECT frame

        svc.set_delay(peer, None, Some(Duration::from_millis(1_000)));
        svc.enqueue_send(client, peer, vec![1, 2, 3, 4], 5_000);

        svc.neighbours.force_disconnect(peer);
        svc.poll_neighbour_changes();

        // DISCONNECT frame plus a failing SEND_OK for the queued send.
        assert_eq!(svc.clients[&client].queue_len(), 3);
        assert!(svc.due_entries(u64::MAX).is_empty());
    }

    #[test]
    fn peer_state_only_reaches_matching_subscription() {
        use crate::ports::inbound::TransportApi;

        let mut svc = service();
        let client = svc.register_client();
        let peer = PeerIdentity::new([2u8; 32]);
        svc.monitor_peer_request(client, peer, false);

        svc.broadcast_peer_state(PeerIdentity::new([3u8; 32]), PeerState::Connected, None);
        assert_eq!(svc.clients[&client].queue_len(), 0);

        svc.broadcast_peer_state(peer, PeerState::Connected, None);
        assert_eq!(svc.clients[&client].queue_len(), 1);
    }
}
