//! Single-threaded cooperative scheduler.
//!
//! Reference: SPEC_FULL.md Section 5. All of `TransportService`'s state
//! is owned by exactly one `Scheduler`, so nothing here ever takes a
//! lock; callers are expected to run this inside a `tokio::task::LocalSet`
//! because the `?Send` ports (`TransportPlugin`, `NeighbourFacade`,
//! `ClientTransport`) are not safe to move across threads.

use std::time::Duration;

use tracing::warn;

use crate::domain::client::ClientId;
use crate::domain::errors::{ClientProtocolError, TransportError};
use crate::ports::inbound::TransportApi;
use crate::ports::outbound::ClientTransport;
use crate::wire::ClientMessage;

use super::core::TransportService;

/// How often the scheduler wakes up to flush delayed sends and expire
/// stale blacklist queries, absent any client activity.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Drives a [`TransportService`] against one concrete [`ClientTransport`].
pub struct Scheduler<T: ClientTransport> {
    service: TransportService,
    transport: T,
}

impl<T: ClientTransport> Scheduler<T> {
    pub fn new(service: TransportService, transport: T) -> Self {
        Self { service, transport }
    }

    pub fn service(&self) -> &TransportService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut TransportService {
        &mut self.service
    }

    /// One scheduling pass: flush expired blacklist queries, resolve any
    /// blacklist decisions a pending `REQUEST_CONNECT` was waiting on,
    /// dispatch any manipulation-delay entries whose deadline has
    /// elapsed, and write one queued frame per client to its transport.
    pub async fn tick(&mut self) {
        let now = self.service.now_ms();
        self.service.poll_neighbour_changes();
        self.service.expire_blacklist_queries(now);
        self.service.poll_pending_connects();

        let due = self.service.due_entries(now);
        for entry in due {
            let (continuation, result) = self.service.dispatch_entry(entry).await;
            if result.success {
                self.service.record_payload_sent(continuation.client);
            }
            let msg = ClientMessage::SendOk {
                success: result.success as u32,
                bytes_msg: result.bytes_msg,
                bytes_physical: result.bytes_physical,
                latency_us: result.latency_ms.saturating_mul(1_000),
                peer: continuation.target,
            };
            self.service.send_to_client(continuation.client, &msg, false);
        }

        self.drain_outbound().await;
    }

    /// Write at most one queued frame per client, respecting each
    /// client's single-in-flight-transmit rule (Section 4.1).
    async fn drain_outbound(&mut self) {
        let client_ids: Vec<ClientId> = self.service.clients.keys().copied().collect();
        for client in client_ids {
            let frame = self
                .service
                .clients
                .get_mut(&client)
                .and_then(|conn| conn.pop_next());
            let Some(frame) = frame else { continue };

            self.transport.write_frame(client, &frame.bytes).await;
            if let Some(conn) = self.service.clients.get_mut(&client) {
                conn.transmit_complete();
            }
        }
    }

    /// Run `tick` forever at [`TICK_INTERVAL`]. Intended for production
    /// wiring; tests drive `tick` directly against a fixed clock instead.
    pub async fn run_forever(&mut self) -> ! {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Disconnect a client, tearing down its queue and subscriptions and
    /// asking the transport to close the underlying connection.
    pub async fn disconnect_client(&mut self, client: ClientId) {
        if let Some(conn) = self.service.clients.get_mut(&client) {
            conn.clear();
        }
        self.service.client_disconnected(client);
        self.transport.disconnect(client).await;
    }

    /// Decode and dispatch one raw inbound frame from `client`, the
    /// service-entry counterpart of `drain_outbound` (Section 2's
    /// component 8, Section 4.1's failure policy). A frame that fails to
    /// decode, or whose contents are a protocol violation, disconnects
    /// only that client; the rest of the service keeps running.
    pub async fn handle_incoming(&mut self, client: ClientId, frame: &[u8]) {
        let msg = match ClientMessage::decode(frame) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(?client, %err, "malformed client frame, disconnecting");
                self.disconnect_client(client).await;
                return;
            }
        };

        if let Err(err) = self.dispatch(client, msg).await {
            warn!(?client, %err, "client protocol error, disconnecting");
            self.disconnect_client(client).await;
        }
    }

    async fn dispatch(&mut self, client: ClientId, msg: ClientMessage) -> Result<(), TransportError> {
        match msg {
            ClientMessage::Start { options, self_id } => {
                let check_self = options & 0x1 != 0;
                let wants_payload = options & 0x2 != 0;
                self.service.start(client, check_self, self_id, wants_payload)?;
            }
            ClientMessage::Hello { hello_bytes } => {
                self.service.hello(client, &hello_bytes);
            }
            ClientMessage::Send {
                peer,
                timeout_us,
                payload,
            } => {
                self.service
                    .send_payload(client, peer, timeout_us / 1_000, payload)?;
            }
            ClientMessage::RequestConnect { connect, peer } => match connect {
                1 => {
                    // The blacklist decision may depend on a BLACKLIST_REPLY
                    // from a decider client that arrives via a later, separate
                    // `handle_incoming` call; awaiting it right here would park
                    // this whole &mut self borrow and deadlock the single
                    // owning task (Section 5). Stash it instead and let
                    // `Scheduler::tick` resolve it once it's ready.
                    if let Some(rx) = self.service.request_connect(client, peer, true) {
                        self.service.stash_pending_connect(peer, rx);
                    }
                }
                0 => {
                    self.service.request_connect(client, peer, false);
                }
                other => return Err(ClientProtocolError::InvalidConnectFlag(other).into()),
            },
            ClientMessage::AddressToString {
                numeric_only,
                timeout_us,
                address,
                plugin_name,
            } => {
                self.service
                    .address_to_string(client, plugin_name, address, numeric_only, timeout_us / 1_000)
                    .await;
            }
            ClientMessage::MonitorPeerRequest { one_shot, peer } => {
                self.service.monitor_peer_request(client, peer, one_shot != 0)?;
            }
            ClientMessage::MonitorValidationRequest { one_shot, peer } => {
                self.service
                    .monitor_validation_request(client, peer, one_shot != 0)?;
            }
            ClientMessage::BlacklistInit => {
                self.service.blacklist_init(client);
            }
            ClientMessage::BlacklistReply { is_allowed, peer } => {
                self.service.blacklist_reply(client, peer, is_allowed != 0);
            }
            ClientMessage::TrafficMetric {
                peer,
                delay_in_us,
                delay_out_us,
                properties,
            } => {
                self.service
                    .traffic_metric(peer, delay_in_us / 1_000, delay_out_us / 1_000, properties);
            }
            // Every other variant is service-to-client only; a client
            // sending one of these is a protocol violation.
            other => return Err(ClientProtocolError::UnexpectedDirection(other_type_tag(&other)).into()),
        }
        Ok(())
    }
}

/// Best-effort type tag for an already-decoded message, used only for
/// the `UnexpectedDirection` error's log field.
fn other_type_tag(msg: &ClientMessage) -> u16 {
    use crate::wire::message_type as mt;
    match msg {
        ClientMessage::SendOk { .. } => mt::SEND_OK,
        ClientMessage::Connect { .. } => mt::CONNECT,
        ClientMessage::Disconnect { .. } => mt::DISCONNECT,
        ClientMessage::AddressToStringReply { .. } => mt::ADDRESS_TO_STRING_REPLY,
        ClientMessage::MonitorPeerResponse { .. } | ClientMessage::MonitorPeerResponseEnd => {
            mt::MONITOR_PEER_RESPONSE
        }
        ClientMessage::MonitorValidationResponse { .. } | ClientMessage::MonitorValidationResponseEnd => {
            mt::MONITOR_VALIDATION_RESPONSE
        }
        ClientMessage::BlacklistQuery { .. } => mt::BLACKLIST_QUERY,
        ClientMessage::Recv { .. } => mt::RECV,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedTimeSource;
    use crate::adapters::neighbour::InMemoryNeighbours;
    use crate::domain::config::TransportConfig;
    use crate::domain::identity::PeerIdentity;
    use crate::ports::inbound::TransportApi;
    use crate::ports::outbound::NeighbourFacade;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct RecordingTransport {
        written: Rc<RefCell<Vec<(ClientId, Vec<u8>)>>>,
        disconnected: Rc<RefCell<Vec<ClientId>>>,
    }

    #[async_trait(?Send)]
    impl ClientTransport for RecordingTransport {
        async fn write_frame(&mut self, client: ClientId, frame: &[u8]) {
            self.written.borrow_mut().push((client, frame.to_vec()));
        }

        async fn disconnect(&mut self, client: ClientId) {
            self.disconnected.borrow_mut().push(client);
        }
    }

    fn scheduler() -> Scheduler<RecordingTransport> {
        let service = TransportService::new(
            PeerIdentity::wildcard(),
            Box::new(InMemoryNeighbours::new()),
            Box::new(FixedTimeSource::new(0)),
            TransportConfig::default(),
        );
        Scheduler::new(service, RecordingTransport::default())
    }

    #[tokio::test]
    async fn tick_drains_one_frame_per_client() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();
        sched
            .service_mut()
            .start(client, false, PeerIdentity::wildcard(), true)
            .unwrap();
        sched.service_mut().monitor_peer_request(client, PeerIdentity::wildcard(), false);
        sched
            .service_mut()
            .broadcast_peer_state(PeerIdentity::new([1u8; 32]), crate::domain::monitor::PeerState::Connected, None);

        assert_eq!(sched.service().clients[&client].queue_len(), 1);
        sched.tick().await;
        assert_eq!(sched.service().clients[&client].queue_len(), 0);
        assert_eq!(sched.transport.written.borrow().len(), 1);
    }

    #[tokio::test]
    async fn disconnect_client_clears_queue_and_notifies_transport() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();
        sched.disconnect_client(client).await;
        assert_eq!(sched.transport.disconnected.borrow().as_slice(), &[client]);
    }

    #[tokio::test]
    async fn handle_incoming_dispatches_a_decoded_start_frame() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();

        let frame = ClientMessage::Start {
            options: 0,
            self_id: PeerIdentity::wildcard(),
        }
        .encode();
        sched.handle_incoming(client, &frame).await;

        assert!(sched.service().clients[&client].started);
        assert!(sched.transport.disconnected.borrow().is_empty());
    }

    #[tokio::test]
    async fn handle_incoming_disconnects_on_malformed_frame() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();

        sched.handle_incoming(client, &[0xff]).await;

        assert_eq!(sched.transport.disconnected.borrow().as_slice(), &[client]);
    }

    #[tokio::test]
    async fn handle_incoming_disconnects_on_service_to_client_only_message() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();

        let frame = ClientMessage::MonitorPeerResponseEnd.encode();
        sched.handle_incoming(client, &frame).await;

        assert_eq!(sched.transport.disconnected.borrow().as_slice(), &[client]);
    }

    #[tokio::test]
    async fn handle_incoming_disconnects_on_protocol_violation() {
        let mut sched = scheduler();
        let client = sched.service_mut().register_client();

        // SEND before START is a protocol violation (StartNotYetSent).
        let frame = ClientMessage::Send {
            peer: PeerIdentity::new([1u8; 32]),
            timeout_us: 1_000,
            payload: vec![1, 2, 3],
        }
        .encode();
        sched.handle_incoming(client, &frame).await;

        assert_eq!(sched.transport.disconnected.borrow().as_slice(), &[client]);
    }

    /// A REQUEST_CONNECT whose blacklist decision depends on a decider's
    /// BLACKLIST_REPLY must resolve across separate `handle_incoming`
    /// calls and a `tick`, never by awaiting inline inside the call that
    /// decoded REQUEST_CONNECT (which would deadlock -- the reply is
    /// decoded by a second, later `handle_incoming` call on the same
    /// `&mut self` scheduler).
    #[tokio::test]
    async fn request_connect_resolves_across_scheduler_turns_without_deadlocking() {
        let mut sched = scheduler();
        let decider = sched.service_mut().register_client();
        sched.service_mut().blacklist_init(decider);

        let requester = sched.service_mut().register_client();
        let peer = PeerIdentity::new([9u8; 32]);

        let connect_frame = ClientMessage::RequestConnect { connect: 1, peer }.encode();
        sched.handle_incoming(requester, &connect_frame).await;
        assert!(!sched.service().neighbours.is_connected(peer));

        // Ticking before the decider replies leaves the decision parked.
        sched.tick().await;
        assert!(!sched.service().neighbours.is_connected(peer));

        let reply_frame = ClientMessage::BlacklistReply { is_allowed: 1, peer }.encode();
        sched.handle_incoming(decider, &reply_frame).await;

        sched.tick().await;
        assert!(sched.service().neighbours.is_connected(peer));
    }
}
