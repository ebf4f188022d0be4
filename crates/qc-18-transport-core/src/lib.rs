//! # Transport Service Core
//!
//! **Subsystem ID:** 18
//!
//! Sits between wire-transport plugins (TCP, UDP, ...) and the
//! neighbour/routing subsystem, and is the single point every local
//! client talks to: session and address bookkeeping, artificial link
//! manipulation for testing, and the peer-connection blacklist arbiter.
//!
//! ## Architecture
//!
//! Hexagonal, same shape as the rest of the workspace:
//! - **Domain layer:** addresses, sessions, ATS records, manipulation
//!   overlays, blacklist rules, per-client connection state — all pure,
//!   no I/O.
//! - **Ports layer:** the client-facing API (`TransportApi`) and the
//!   capabilities this crate consumes from its collaborators
//!   (`TransportPlugin`, `NeighbourFacade`, `ConfigProvider`,
//!   `TimeSource`, `ClientTransport`).
//! - **Wire layer:** bit-exact framing for the client<->service control
//!   protocol.
//! - **Service layer:** `TransportService`, the sole implementor of
//!   every port, plus `Scheduler`, the single-threaded cooperative event
//!   loop that owns it.
//! - **Adapters layer:** in-memory reference implementations good
//!   enough to wire up a real binary or drive this crate's own tests.
//!
//! ## Concurrency
//!
//! `TransportService` is `!Send` by design: its ports are written
//! `#[async_trait(?Send)]` and its state is never behind a lock. Run a
//! `Scheduler` inside a `tokio::task::LocalSet`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod wire;

pub use domain::{
    Address, AddressRecord, AtsHandle, AtsProperties, AtsProperty, BlacklistRule,
    ClientConnection, ClientId, DelayQueueEntry, ManipulationPeer, NetworkType, OutboundFrame,
    PeerIdentity, PeerState, SendContinuation, SessionId, TransportConfig, TransportError,
    ValidationState, MAX_PENDING,
};

pub use ports::{
    ClientTransport, ConfigProvider, NeighbourFacade, PeerMonitorEvent, SendOutcome, SendResult,
    TimeSource, TransportApi, TransportPlugin, ValidationMonitorEvent,
};

pub use service::{Scheduler, TransportService};

pub use wire::ClientMessage;
