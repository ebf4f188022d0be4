//! Per-client connection state.
//!
//! Reference: SPEC_FULL.md Section 3 (ClientConnection) and Section 4.1.

use std::collections::VecDeque;

/// Soft cap on a client's pending outbound queue (128 Ki), per Section 3.
pub const MAX_PENDING: usize = 128 * 1024;

/// Monotonically increasing identifier assigned to each local client
/// connection. Not part of the wire protocol; used only to key the
/// service's internal maps (Section 3, `[SUPPLEMENT]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

/// An already wire-encoded frame waiting to be written to the client
/// socket.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub bytes: Vec<u8>,
    /// If true, this frame may be dropped under backpressure (Section
    /// 4.1). Control-plane frames (e.g. `SEND_OK`, monitor notifications
    /// a client explicitly asked for) are never droppable.
    pub may_drop: bool,
}

impl OutboundFrame {
    pub fn new(bytes: Vec<u8>, may_drop: bool) -> Self {
        Self { bytes, may_drop }
    }
}

/// Per-client state held by the service for the lifetime of one local
/// connection.
#[derive(Debug, Default)]
pub struct ClientConnection {
    queue: VecDeque<OutboundFrame>,
    /// True once an in-flight write to the client socket is outstanding;
    /// the next queued frame is only dispatched after it completes
    /// (Section 4.1: "single in-flight transmit").
    pub transmit_in_flight: bool,
    /// Set from the `START` frame's `payload` option bit; gates whether
    /// this client receives `may_drop` broadcasts (Section 4.1).
    pub send_payload: bool,
    /// Set once a `START` frame has been accepted; further `START`s are a
    /// protocol error.
    pub started: bool,
    /// Count of payload bytes dropped because the target peer was not
    /// connected (Section 4.1, scenario S3).
    pub bytes_dropped: u64,
    /// Count of frames dropped due to a full outbound queue.
    pub frames_dropped: u64,
    /// Count of successful payload sends, used for CONNECT-time
    /// reporting and tests.
    pub payload_sent: u64,
}

impl ClientConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a frame, applying the drop-newest backpressure policy from
    /// Section 4.1: droppable frames are discarded once the queue is at
    /// `MAX_PENDING`; non-droppable (control) frames are always queued.
    pub fn enqueue(&mut self, frame: OutboundFrame) {
        if frame.may_drop && self.queue.len() >= MAX_PENDING {
            self.frames_dropped += 1;
            return;
        }
        self.queue.push_back(frame);
    }

    /// Pop the next frame to transmit, if any and no transmit is already
    /// in flight.
    pub fn pop_next(&mut self) -> Option<OutboundFrame> {
        if self.transmit_in_flight {
            return None;
        }
        let frame = self.queue.pop_front();
        if frame.is_some() {
            self.transmit_in_flight = true;
        }
        frame
    }

    pub fn transmit_complete(&mut self) {
        self.transmit_in_flight = false;
    }

    /// Drop every queued frame, e.g. on client disconnect.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.transmit_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_newest_applies_only_to_droppable_frames() {
        let mut client = ClientConnection::new();
        for _ in 0..MAX_PENDING {
            client.enqueue(OutboundFrame::new(vec![0], true));
        }
        assert_eq!(client.queue_len(), MAX_PENDING);

        // A droppable frame beyond the cap is discarded.
        client.enqueue(OutboundFrame::new(vec![1], true));
        assert_eq!(client.queue_len(), MAX_PENDING);
        assert_eq!(client.frames_dropped, 1);

        // A control frame is queued even above the soft limit (Invariant 3).
        client.enqueue(OutboundFrame::new(vec![2], false));
        assert_eq!(client.queue_len(), MAX_PENDING + 1);
    }

    #[test]
    fn only_one_transmit_in_flight() {
        let mut client = ClientConnection::new();
        client.enqueue(OutboundFrame::new(vec![1], false));
        client.enqueue(OutboundFrame::new(vec![2], false));

        let first = client.pop_next();
        assert!(first.is_some());
        assert!(client.pop_next().is_none(), "second pop must wait");

        client.transmit_complete();
        let second = client.pop_next();
        assert!(second.is_some());
    }
}
