//! Manipulation-layer types (artificial delay / synthetic link quality).
//!
//! Reference: SPEC_FULL.md Section 3 (ManipulationPeer, DelayQueueEntry)
//! and Section 4.3.

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::ats::AtsProperties;
use crate::domain::client::ClientId;
use crate::domain::identity::PeerIdentity;

/// Per-peer (or global, when keyed by [`PeerIdentity::wildcard`])
/// manipulation overlay.
#[derive(Debug, Clone, Default)]
pub struct ManipulationPeer {
    pub delay_in: Option<Duration>,
    pub delay_out: Option<Duration>,
    pub synthetic_properties: Option<AtsProperties>,
    pub queue: VecDeque<DelayQueueEntry>,
}

impl ManipulationPeer {
    pub fn is_empty_overlay(&self) -> bool {
        self.delay_in.is_none() && self.delay_out.is_none() && self.synthetic_properties.is_none()
    }
}

/// Identifies who should be notified once a delayed send actually goes
/// out (or is dropped on disconnect). Carries exactly the state needed to
/// route a `SEND_OK` back to the originating client (Section 9's
/// "typed continuation" strategy).
#[derive(Debug, Clone, Copy)]
pub struct SendContinuation {
    pub client: ClientId,
    pub target: PeerIdentity,
    pub bytes_msg: u32,
}

/// One outbound payload sitting in a manipulation FIFO, waiting for its
/// artificial delay to elapse.
#[derive(Debug, Clone)]
pub struct DelayQueueEntry {
    pub target: PeerIdentity,
    pub payload: Vec<u8>,
    /// Absolute monotonic deadline (milliseconds since the service's
    /// epoch) at which this entry should be handed to the neighbour
    /// facade.
    pub sent_at_ms: u64,
    pub timeout_ms: u64,
    pub continuation: SendContinuation,
}

impl DelayQueueEntry {
    pub fn new(
        target: PeerIdentity,
        payload: Vec<u8>,
        sent_at_ms: u64,
        timeout_ms: u64,
        continuation: SendContinuation,
    ) -> Self {
        Self {
            target,
            payload,
            sent_at_ms,
            timeout_ms,
            continuation,
        }
    }
}
