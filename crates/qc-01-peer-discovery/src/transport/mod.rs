//! Transport layer modules.
//!
//! ## Available Transports
//!
//! - `quic` - QUIC/HTTP3 with encrypted headers

pub mod quic;

pub use quic::{QuicConfig, QuicConnectionState, QuicTransport, ReplayProtection};
