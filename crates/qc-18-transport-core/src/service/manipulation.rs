//! Manipulation layer: artificial delay and synthetic ATS properties.
//!
//! Reference: SPEC_FULL.md Section 4.3.

use std::time::Duration;

use crate::domain::ats::AtsProperties;
use crate::domain::client::ClientId;
use crate::domain::identity::PeerIdentity;
use crate::domain::manipulation::{DelayQueueEntry, ManipulationPeer, SendContinuation};
use crate::ports::inbound::SendResult;

use super::core::TransportService;

impl TransportService {
    pub fn set_delay(&mut self, peer: PeerIdentity, delay_in: Option<Duration>, delay_out: Option<Duration>) {
        let overlay = self.manipulation.entry(peer).or_default();
        overlay.delay_in = delay_in;
        overlay.delay_out = delay_out;
        self.drop_overlay_if_empty(peer);
    }

    pub fn set_synthetic_properties(&mut self, peer: PeerIdentity, properties: Option<AtsProperties>) {
        let overlay = self.manipulation.entry(peer).or_default();
        overlay.synthetic_properties = properties;
        self.drop_overlay_if_empty(peer);
    }

    fn drop_overlay_if_empty(&mut self, peer: PeerIdentity) {
        if let Some(overlay) = self.manipulation.get(&peer) {
            if overlay.is_empty_overlay() && overlay.queue.is_empty() {
                self.manipulation.remove(&peer);
            }
        }
    }

    /// Resolve the outbound delay currently in effect for `peer`: the
    /// per-peer overlay takes precedence over the global
    /// (wildcard-keyed) one (Section 4.3).
    fn delay_out_for(&self, peer: PeerIdentity) -> Duration {
        self.manipulation
            .get(&peer)
            .and_then(|o| o.delay_out)
            .or_else(|| self.manipulation.get(&PeerIdentity::wildcard()).and_then(|o| o.delay_out))
            .unwrap_or(Duration::ZERO)
    }

    /// Queue a payload send, applying the peer's (or global) outbound
    /// delay. Returns immediately; the continuation fires once the
    /// delay elapses and the neighbour facade accepts the send.
    pub fn enqueue_send(
        &mut self,
        client: ClientId,
        target: PeerIdentity,
        payload: Vec<u8>,
        timeout_ms: u64,
    ) {
        let delay = self.delay_out_for(target);
        let now = self.now_ms();
        let entry = DelayQueueEntry::new(
            target,
            payload.clone(),
            now + delay.as_millis() as u64,
            timeout_ms,
            SendContinuation {
                client,
                target,
                bytes_msg: payload.len() as u32,
            },
        );
        self.manipulation.entry(target).or_default().queue.push_back(entry);
    }

    /// Pop every entry whose delay has elapsed as of `now_ms`, across
    /// all peers. Does not perform the actual send; callers hand the
    /// result to the neighbour facade (Section 5: all I/O happens on the
    /// single owning task, not inside this bookkeeping method).
    pub(crate) fn due_entries(&mut self, now_ms: u64) -> Vec<DelayQueueEntry> {
        let mut due = Vec::new();
        let peers: Vec<PeerIdentity> = self.manipulation.keys().copied().collect();
        for peer in peers {
            if let Some(overlay) = self.manipulation.get_mut(&peer) {
                while let Some(front) = overlay.queue.front() {
                    if front.sent_at_ms > now_ms {
                        break;
                    }
                    due.push(overlay.queue.pop_front().unwrap());
                }
            }
            self.drop_overlay_if_empty(peer);
        }
        due
    }

    /// Drive one delay-queue entry to completion by handing it to the
    /// neighbour facade, producing the `SEND_OK` result its continuation
    /// describes.
    pub async fn dispatch_entry(&mut self, entry: DelayQueueEntry) -> (SendContinuation, SendResult) {
        let outcome = self
            .neighbours
            .send(entry.target, &entry.payload, entry.timeout_ms)
            .await;
        (
            entry.continuation,
            SendResult {
                success: outcome.success,
                bytes_msg: entry.continuation.bytes_msg,
                bytes_physical: outcome.bytes_physical,
                latency_ms: self.now_ms().saturating_sub(entry.sent_at_ms),
            },
        )
    }

    /// Drop every queued send for `peer`, reporting a failed outcome to
    /// each one's continuation (message size preserved, zero bytes on
    /// the wire) rather than silently discarding it, e.g. after the
    /// neighbour subsystem reports the peer disconnected (Section 4.3's
    /// disconnect cleanup). Returns the (continuation, failure result)
    /// pairs so the caller can notify the originating clients; empty if
    /// nothing was queued for `peer`.
    pub fn peer_disconnected(&mut self, peer: PeerIdentity) -> Vec<(SendContinuation, SendResult)> {
        let drained = match self.manipulation.get_mut(&peer) {
            Some(overlay) => overlay.queue.drain(..).collect::<Vec<_>>(),
            None => Vec::new(),
        };
        self.drop_overlay_if_empty(peer);
        drained
            .into_iter()
            .map(|entry| {
                (
                    entry.continuation,
                    SendResult {
                        success: false,
                        bytes_msg: entry.continuation.bytes_msg,
                        bytes_physical: 0,
                        latency_ms: 0,
                    },
                )
            })
            .collect()
    }

    pub fn clear_overlay(&mut self, peer: PeerIdentity) {
        self.manipulation.remove(&peer);
    }

    pub fn overlay(&self, peer: PeerIdentity) -> Option<&ManipulationPeer> {
        self.manipulation.get(&peer)
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
    fn enqueue_respects_delay_out() {
        let mut svc = service();
        let peer = PeerIdentity::new([1u8; 32]);
        svc.set_delay(peer, None, Some(Duration::from_millis(500)));
        svc.enqueue_send(ClientId(0), peer, vec![1, 2, 3], 1_000);

        assert!(svc.due_entries(100).is_empty());
        let due = svc.due_entries(500);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn zero_delay_is_immediately_due() {
        let mut svc = service();
        let peer = PeerIdentity::new([2u8; 32]);
        svc.enqueue_send(ClientId(0), peer, vec![9], 1_000);
        let due = svc.due_entries(0);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn peer_disconnect_drains_queue_and_reports_failure_per_entry() {
        let mut svc = service();
        let peer = PeerIdentity::new([3u8; 32]);
        svc.set_delay(peer, None, Some(Duration::from_millis(1_000)));
        svc.enqueue_send(ClientId(0), peer, vec![1, 2, 3], 1_000);

        let dropped = svc.peer_disconnected(peer);
        assert_eq!(dropped.len(), 1);
        let (continuation, result) = dropped[0];
        assert_eq!(continuation.target, peer);
        assert!(!result.success);
        assert_eq!(result.bytes_msg, 3);
        assert_eq!(result.bytes_physical, 0);
        assert!(svc.due_entries(u64::MAX).is_empty());
    }

    #[test]
    fn disconnect_with_nothing_queued_is_a_no_op() {
        let mut svc = service();
        let peer = PeerIdentity::new([4u8; 32]);
        assert!(svc.peer_disconnected(peer).is_empty());
    }
}
