//! Client façade: dispatch of every inbound message from Section 4.1.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::domain::address::Address;
use crate::domain::ats::AtsProperties;
use crate::domain::client::{ClientId, OutboundFrame};
use crate::domain::errors::{ClientProtocolError, TransportError};
use crate::domain::identity::PeerIdentity;
use crate::domain::monitor::{MonitoringSubscription, PeerState};
use crate::ports::inbound::{PeerMonitorEvent, TransportApi, ValidationMonitorEvent};
use crate::ports::outbound::{NeighbourFacade, PrettyPrintEvent, TransportPlugin};
use crate::wire::ClientMessage;

use super::broadcast::peer_state_to_wire;
use super::core::TransportService;

/// `res` values for `ADDRESS_TO_STRING_REPLY` (Section 4.6). Only this
/// crate's own framing cares about the exact numbers; no GNUnet wire
/// constant is reused here since the original values are unavailable.
const RESULT_OK: i32 = 0;
const RESULT_SYSERR: i32 = -1;

impl TransportService {
    fn ensure_started(&self, client: ClientId) -> Result<(), ClientProtocolError> {
        match self.clients.get(&client) {
            Some(conn) if conn.started => Ok(()),
            Some(_) => Err(ClientProtocolError::StartNotYetSent),
            None => Err(ClientProtocolError::StartNotYetSent),
        }
    }

    /// Encode `msg` and push it onto `client`'s outbound queue.
    pub(crate) fn send_to_client(&mut self, client: ClientId, msg: &ClientMessage, may_drop: bool) {
        let bytes = msg.encode();
        if let Some(conn) = self.clients.get_mut(&client) {
            conn.enqueue(OutboundFrame::new(bytes, may_drop));
        } else {
            warn!(?client, "dropping frame for unknown client");
        }
    }

    /// Bump `client`'s successful-payload-send counter (Section 4.1: a
    /// successful `SEND` increments the originating client's counter).
    pub(crate) fn record_payload_sent(&mut self, client: ClientId) {
        if let Some(conn) = self.clients.get_mut(&client) {
            conn.payload_sent += 1;
        }
    }
}

#[async_trait(?Send)]
impl TransportApi for TransportService {
    fn start(
        &mut self,
        client: ClientId,
        check_self: bool,
        claimed_self: PeerIdentity,
        wants_payload: bool,
    ) -> Result<(), TransportError> {
        let already_started = self
            .clients
            .get(&client)
            .map(|c| c.started)
            .unwrap_or(false);
        if already_started {
            return Err(ClientProtocolError::DuplicateStart.into());
        }
        if check_self && claimed_self != self.own_id {
            return Err(ClientProtocolError::SelfMismatch.into());
        }

        let connected: Vec<PeerIdentity> = self.neighbours.connected_peers();
        if let Some(conn) = self.clients.get_mut(&client) {
            conn.started = true;
            conn.send_payload = wants_payload;
        }
        for peer in connected {
            let msg = ClientMessage::Connect {
                quota_in: 0,
                quota_out: 0,
                peer,
            };
            self.send_to_client(client, &msg, false);
        }
        Ok(())
    }

    fn hello(&mut self, client: ClientId, hello_bytes: &[u8]) {
        trace!(?client, len = hello_bytes.len(), "HELLO forwarded to validation subsystem");
    }

    fn send_payload(
        &mut self,
        client: ClientId,
        target: PeerIdentity,
        timeout_ms: u64,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.ensure_started(client)?;

        if !self.neighbours.is_connected(target) {
            if let Some(conn) = self.clients.get_mut(&client) {
                conn.bytes_dropped += payload.len() as u64;
            }
            debug!(?target, "dropping SEND: peer not connected");
            return Ok(());
        }

        self.enqueue_send(client, target, payload, timeout_ms);
        Ok(())
    }

    fn request_connect(
        &mut self,
        client: ClientId,
        peer: PeerIdentity,
        connect: bool,
    ) -> Option<oneshot::Receiver<bool>> {
        if peer == self.own_id {
            debug!(?client, "REQUEST_CONNECT referencing our own identity, ignoring");
            return None;
        }
        if !connect {
            self.neighbours.force_disconnect(peer);
            return None;
        }
        debug!(?client, ?peer, "REQUEST_CONNECT: consulting blacklist arbiter");
        Some(self.test_allowed(peer, ""))
    }

    fn monitor_peer_request(
        &mut self,
        client: ClientId,
        filter_peer: PeerIdentity,
        one_shot: bool,
    ) -> Result<Vec<PeerMonitorEvent>, TransportError> {
        if !one_shot {
            if self.peer_monitors.iter().any(|sub| sub.client == client) {
                return Err(ClientProtocolError::DuplicateMonitorRegistration.into());
            }
            self.peer_monitors
                .push(MonitoringSubscription::new(client, filter_peer));
        }

        let events: Vec<PeerMonitorEvent> = self
            .neighbours
            .connected_peers()
            .into_iter()
            .filter(|peer| filter_peer.is_wildcard() || *peer == filter_peer)
            .map(|peer| PeerMonitorEvent {
                peer,
                address: None,
                state: PeerState::Connected,
                state_timeout_ms: 0,
            })
            .collect();

        for event in &events {
            let msg = ClientMessage::MonitorPeerResponse {
                peer: event.peer,
                local_info: 0,
                state: peer_state_to_wire(event.state),
                state_timeout_us: event.state_timeout_ms.saturating_mul(1_000),
                address: Vec::new(),
                plugin_name: String::new(),
            };
            self.send_to_client(client, &msg, false);
        }
        if one_shot {
            self.send_to_client(client, &ClientMessage::MonitorPeerResponseEnd, false);
        }
        Ok(events)
    }

    fn monitor_validation_request(
        &mut self,
        client: ClientId,
        filter_peer: PeerIdentity,
        one_shot: bool,
    ) -> Result<Vec<ValidationMonitorEvent>, TransportError> {
        if !one_shot {
            if self.validation_monitors.iter().any(|sub| sub.client == client) {
                return Err(ClientProtocolError::DuplicateMonitorRegistration.into());
            }
            self.validation_monitors
                .push(MonitoringSubscription::new(client, filter_peer));
        }
        // Validation state is owned by the (out-of-scope) validation
        // subsystem; this core has nothing of its own to report, so the
        // snapshot is always empty -- only the (possible) terminator
        // goes out.
        if one_shot {
            self.send_to_client(client, &ClientMessage::MonitorValidationResponseEnd, false);
        }
        Ok(Vec::new())
    }

    fn blacklist_init(&mut self, client: ClientId) {
        TransportService::blacklist_init(self, client);
    }

    fn blacklist_reply(&mut self, client: ClientId, peer: PeerIdentity, is_allowed: bool) {
        if let Err(err) = TransportService::blacklist_reply(self, client, peer, is_allowed) {
            debug!(?client, ?peer, %err, "BLACKLIST_REPLY for a query we don't have");
        }
    }

    fn traffic_metric(
        &mut self,
        peer: PeerIdentity,
        delay_in_ms: u64,
        delay_out_ms: u64,
        properties: AtsProperties,
    ) {
        self.set_delay(
            peer,
            Some(Duration::from_millis(delay_in_ms)),
            Some(Duration::from_millis(delay_out_ms)),
        );
        // A client may legitimately send an empty property list just to
        // adjust delay; that is not an error (Open Question resolved in
        // SPEC_FULL.md Section 9) and must not clear properties set by a
        // previous TRAFFIC_METRIC.
        if !properties.is_empty() {
            self.set_synthetic_properties(peer, Some(properties));
        }
    }

    async fn address_to_string(
        &mut self,
        client: ClientId,
        plugin_name: String,
        address_bytes: Vec<u8>,
        numeric_only: bool,
        timeout_ms: u64,
    ) {
        // Resolve and fully await the plugin's pretty-printer before doing
        // any further &mut self work -- holding a borrow of self.plugins
        // across the later send_to_client calls would not type-check.
        let events = match self.plugins.get(&plugin_name) {
            None => None,
            Some(plugin) => {
                let address = Address::new(PeerIdentity::wildcard(), plugin_name.clone(), address_bytes, 0);
                let fut = plugin.address_pretty_printer(&address, numeric_only);
                match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                    Ok(events) => Some(events),
                    Err(_) => {
                        debug!(?client, %plugin_name, "address_to_string timed out");
                        Some(Vec::new())
                    }
                }
            }
        };

        match events {
            None => {
                self.send_to_client(client, &ClientMessage::AddressToStringReply { res: RESULT_SYSERR, string: None }, false);
                self.send_to_client(client, &ClientMessage::AddressToStringReply { res: RESULT_OK, string: None }, false);
            }
            Some(events) => {
                for event in events {
                    match event {
                        PrettyPrintEvent::Intermediate(s) => {
                            self.send_to_client(
                                client,
                                &ClientMessage::AddressToStringReply { res: RESULT_OK, string: Some(s) },
                                false,
                            );
                        }
                        PrettyPrintEvent::TransientError => {
                            self.send_to_client(
                                client,
                                &ClientMessage::AddressToStringReply { res: RESULT_SYSERR, string: None },
                                false,
                            );
                        }
                        PrettyPrintEvent::Done => {}
                    }
                }
                self.send_to_client(client, &ClientMessage::AddressToStringReply { res: RESULT_OK, string: None }, false);
            }
        }
    }

    fn client_disconnected(&mut self, client: ClientId) {
        self.clients.remove(&client);
        self.blacklist_init_clients.retain(|c| *c != client);
        self.blacklist_client_disconnected(client);
        self.peer_monitors.retain(|sub| sub.client != client);
        self.validation_monitors.retain(|sub| sub.client != client);
    }
}

impl TransportService {
    /// Apply the blacklist arbiter's decision for an earlier
    /// `request_connect(connect = true)` call. Separate from
    /// `request_connect` itself because the decision only becomes known
    /// asynchronously, potentially turns on a `BLACKLIST_REPLY` that
    /// hasn't arrived yet, and so is resolved from
    /// [`Self::poll_pending_connects`] rather than at the call site.
    pub fn finish_request_connect(&mut self, peer: PeerIdentity, allowed: bool) {
        if allowed {
            self.neighbours.try_connect(peer);
        } else {
            debug!(?peer, "REQUEST_CONNECT denied by blacklist arbiter");
        }
    }

    /// Park a `REQUEST_CONNECT`'s pending blacklist decision for
    /// [`Self::poll_pending_connects`] to resolve on a later scheduler
    /// turn, instead of awaiting it inline (Section 5: awaiting it here
    /// would hold this call's `&mut self` borrow across suspension,
    /// blocking the very `BLACKLIST_REPLY` dispatch the decision depends
    /// on).
    pub(crate) fn stash_pending_connect(&mut self, peer: PeerIdentity, rx: oneshot::Receiver<bool>) {
        self.pending_connects.push((peer, rx));
    }

    /// Poll every parked `REQUEST_CONNECT` decision without blocking;
    /// unresolved ones are put back for the next tick. A decider
    /// disconnecting mid-query or never replying still eventually
    /// resolves the receiver (Section 4.4), so a closed channel is
    /// treated the same as the query having nothing left to decide:
    /// allow.
    pub(crate) fn poll_pending_connects(&mut self) {
        let pending = std::mem::take(&mut self.pending_connects);
        for (peer, mut rx) in pending {
            match rx.try_recv() {
                Ok(allowed) => self.finish_request_connect(peer, allowed),
                Err(oneshot::error::TryRecvError::Empty) => self.pending_connects.push((peer, rx)),
                Err(oneshot::error::TryRecvError::Closed) => {
                    debug!(?peer, "pending REQUEST_CONNECT's decision channel closed, defaulting to allow");
                    self.finish_request_connect(peer, true);
                }
            }
        }
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

    #[test]
    fn duplicate_start_is_rejected() {
        let mut svc = service();
        let client = svc.register_client();
        svc.start(client, false, PeerIdentity::wildcard(), true).unwrap();
        let err = svc.start(client, false, PeerIdentity::wildcard(), true).unwrap_err();
        assert!(matches!(err, TransportError::ClientProtocol(ClientProtocolError::DuplicateStart)));
    }

    #[test]
    fn self_mismatch_is_rejected_when_checked() {
        let mut svc = service();
        let client = svc.register_client();
        let wrong = PeerIdentity::new([9u8; 32]);
        let err = svc.start(client, true, wrong, true).unwrap_err();
        assert!(matches!(err, TransportError::ClientProtocol(ClientProtocolError::SelfMismatch)));
    }

    #[test]
    fn send_before_start_is_rejected() {
        let mut svc = service();
        let client = svc.register_client();
        let err = svc
            .send_payload(client, PeerIdentity::new([1u8; 32]), 1_000, vec![1])
            .unwrap_err();
        assert!(matches!(err, TransportError::ClientProtocol(ClientProtocolError::StartNotYetSent)));
    }

    #[test]
    fn send_to_disconnected_peer_drops_silently_and_counts_bytes() {
        let mut svc = service();
        let client = svc.register_client();
        svc.start(client, false, PeerIdentity::wildcard(), true).unwrap();
        svc.send_payload(client, PeerIdentity::new([2u8; 32]), 1_000, vec![1, 2, 3])
            .unwrap();
        assert_eq!(svc.clients[&client].bytes_dropped, 3);
    }

    #[test]
    fn force_disconnect_skips_blacklist() {
        let mut svc = service();
        let client = svc.register_client();
        let peer = PeerIdentity::new([3u8; 32]);
        assert!(svc.request_connect(client, peer, false).is_none());
    }

    #[tokio::test]
    async fn veto_blocks_connect_but_allow_lets_it_through() {
        let mut svc = service();
        let client = svc.register_client();
        svc.blacklist_init(client);

        let peer = PeerIdentity::new([4u8; 32]);
        let rx = svc.request_connect(client, peer, true).unwrap();
        svc.blacklist_reply(client, peer, false);
        let allowed = rx.await.unwrap();
        svc.finish_request_connect(peer, allowed);
        assert!(!svc.neighbours.is_connected(peer));

        let peer2 = PeerIdentity::new([5u8; 32]);
        let rx2 = svc.request_connect(client, peer2, true).unwrap();
        svc.blacklist_reply(client, peer2, true);
        let allowed2 = rx2.await.unwrap();
        svc.finish_request_connect(peer2, allowed2);
        assert!(svc.neighbours.is_connected(peer2));
    }

    #[test]
    fn client_disconnected_clears_subscriptions() {
        let mut svc = service();
        let client = svc.register_client();
        svc.monitor_peer_request(client, PeerIdentity::wildcard(), false);
        svc.client_disconnected(client);
        assert!(svc.peer_monitors.is_empty());
        assert!(!svc.clients.contains_key(&client));
    }

    #[test]
    fn request_connect_ignores_our_own_identity() {
        let mut svc = service();
        let client = svc.register_client();
        let own_id = svc.own_id();
        assert!(svc.request_connect(client, own_id, true).is_none());
    }

    #[test]
    fn duplicate_peer_monitor_registration_is_rejected() {
        let mut svc = service();
        let client = svc.register_client();
        svc.monitor_peer_request(client, PeerIdentity::wildcard(), false).unwrap();
        let err = svc
            .monitor_peer_request(client, PeerIdentity::wildcard(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ClientProtocol(ClientProtocolError::DuplicateMonitorRegistration)
        ));
    }

    #[test]
    fn one_shot_peer_monitor_does_not_register_and_sends_terminator() {
        let mut svc = service();
        let client = svc.register_client();
        svc.monitor_peer_request(client, PeerIdentity::wildcard(), true).unwrap();
        assert!(svc.peer_monitors.is_empty());
        assert_eq!(svc.clients[&client].queue_len(), 1);
    }

    #[test]
    fn monitor_peer_request_emits_one_frame_per_connected_peer() {
        let mut svc = service();
        let client = svc.register_client();
        let peer = PeerIdentity::new([6u8; 32]);
        svc.neighbours.try_connect(peer);
        let events = svc
            .monitor_peer_request(client, PeerIdentity::wildcard(), false)
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(svc.clients[&client].queue_len(), 1);
    }

    #[tokio::test]
    async fn address_to_string_unknown_plugin_sends_syserr_then_terminator() {
        let mut svc = service();
        let client = svc.register_client();
        svc.address_to_string(client, "nonexistent".into(), vec![1, 2, 3], false, 1_000)
            .await;
        assert_eq!(svc.clients[&client].queue_len(), 2);
    }

    #[cfg(feature = "test-utils")]
    #[tokio::test]
    async fn address_to_string_known_plugin_streams_events_then_terminator() {
        use crate::adapters::plugin_noop::InMemoryPlugin;
        use crate::domain::ats::NetworkType;

        let mut svc = service();
        svc.register_plugin(Box::new(InMemoryPlugin::new("tcp", NetworkType::Wan)));
        let client = svc.register_client();

        svc.address_to_string(client, "tcp".into(), vec![1, 2, 3], false, 1_000)
            .await;
        // InMemoryPlugin's pretty-printer yields one Intermediate followed
        // by Done; Done contributes no frame of its own, so this is the one
        // Intermediate reply plus the mandatory terminator.
        assert_eq!(svc.clients[&client].queue_len(), 2);
    }
}
