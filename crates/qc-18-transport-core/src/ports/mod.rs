//! Ports layer: trait boundaries between the transport core and its
//! driving/driven collaborators.
//!
//! Reference: SPEC_FULL.md Section 2 and Section 4.

pub mod inbound;
pub mod outbound;

pub use inbound::{PeerMonitorEvent, SendResult, TransportApi, ValidationMonitorEvent};
pub use outbound::{
    ClientTransport, ConfigProvider, NeighbourFacade, PrettyPrintEvent, SendOutcome, TimeSource,
    TransportPlugin,
};
