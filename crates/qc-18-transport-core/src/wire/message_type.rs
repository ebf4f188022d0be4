//! Client<->service message type tags (Section 6's framing table).
//!
//! These numeric values are internal to this crate — the values assigned
//! to transport control messages in the original protocol this spec was
//! distilled from are not available to this implementation (see
//! SPEC_FULL.md's note on `original_source/`), so a fresh, densely packed
//! numbering is used here instead of guessing at upstream constants.

pub const START: u16 = 1;
pub const HELLO: u16 = 2;
pub const SEND: u16 = 3;
pub const SEND_OK: u16 = 4;
pub const CONNECT: u16 = 5;
pub const DISCONNECT: u16 = 6;
pub const REQUEST_CONNECT: u16 = 7;
pub const ADDRESS_TO_STRING: u16 = 8;
pub const ADDRESS_TO_STRING_REPLY: u16 = 9;
pub const MONITOR_PEER_REQUEST: u16 = 10;
pub const MONITOR_PEER_RESPONSE: u16 = 11;
pub const MONITOR_VALIDATION_REQUEST: u16 = 12;
pub const MONITOR_VALIDATION_RESPONSE: u16 = 13;
pub const TRAFFIC_METRIC: u16 = 14;
pub const BLACKLIST_INIT: u16 = 15;
pub const BLACKLIST_QUERY: u16 = 16;
pub const BLACKLIST_REPLY: u16 = 17;
/// Delivers an inbound payload to every client subscribed to receive
/// payloads (`START.wants_payload`), completing the broadcast discipline
/// Section 4.1 describes but the distilled framing table left implicit.
pub const RECV: u16 = 18;

/// Fixed size of the `{size: u16, type: u16}` frame header, in bytes.
pub const HEADER_SIZE: usize = 4;
