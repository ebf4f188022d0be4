//! Wire framing layer: message type tags and the bit-exact codec
//! (Section 6).

pub mod codec;
pub mod message_type;

pub use codec::ClientMessage;
