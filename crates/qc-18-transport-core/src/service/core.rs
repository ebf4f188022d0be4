//! Shared state and construction for the transport service.
//!
//! Reference: SPEC_FULL.md Section 2 (components) and Section 5
//! (concurrency model — single-threaded, no cross-task locking).

use std::collections::{HashMap, HashSet};

use tokio::sync::oneshot;

use crate::domain::ats::{AddressRecord, AtsHandle};
use crate::domain::blacklist::BlacklistRule;
use crate::domain::client::{ClientConnection, ClientId};
use crate::domain::config::TransportConfig;
use crate::domain::identity::PeerIdentity;
use crate::domain::manipulation::ManipulationPeer;
use crate::domain::monitor::MonitoringSubscription;
use crate::ports::outbound::{NeighbourFacade, TimeSource, TransportPlugin};

use super::blacklist::PendingBlacklistQuery;

/// The transport core's entire mutable state.
///
/// Owned by exactly one task (Section 5); every method on this type and
/// its satellite `impl` blocks (`ats.rs`, `manipulation.rs`,
/// `blacklist.rs`, `client.rs`, `broadcast.rs`) takes `&mut self`, so no
/// internal locking is ever required.
pub struct TransportService {
    pub(crate) own_id: PeerIdentity,

    pub(crate) clients: HashMap<ClientId, ClientConnection>,
    pub(crate) next_client_id: u64,

    /// One or more address records per peer, keyed by peer so
    /// `is_known`/lookups stay O(records for that peer).
    pub(crate) addresses: HashMap<PeerIdentity, Vec<AddressRecord>>,
    pub(crate) next_ats_handle: u64,

    pub(crate) manipulation: HashMap<PeerIdentity, ManipulationPeer>,

    pub(crate) blacklist_rules: Vec<BlacklistRule>,
    pub(crate) blacklist_pending: HashMap<PeerIdentity, PendingBlacklistQuery>,
    /// Clients that sent `BLACKLIST_INIT` and are consulted on every
    /// connect decision (Section 4.4).
    pub(crate) blacklist_init_clients: Vec<ClientId>,

    pub(crate) peer_monitors: Vec<MonitoringSubscription>,
    pub(crate) validation_monitors: Vec<MonitoringSubscription>,

    /// `REQUEST_CONNECT(connect=true)` calls awaiting a blacklist
    /// decision, resolved from `Scheduler::tick` rather than inline so
    /// the decider's own `BLACKLIST_REPLY` (a separate `handle_incoming`
    /// call) is never blocked behind a parked `&mut self` borrow
    /// (Section 5).
    pub(crate) pending_connects: Vec<(PeerIdentity, oneshot::Receiver<bool>)>,

    /// Snapshot of `neighbours.connected_peers()` as of the last tick,
    /// used to derive unsolicited `CONNECT`/`DISCONNECT` frames for every
    /// started client (Section 6's wire table; these are independent of
    /// the Section 4.1 peer-monitor subscription list).
    pub(crate) last_connected: HashSet<PeerIdentity>,
    /// Set once `last_connected` has been seeded by a first
    /// `poll_neighbour_changes` call. Until then, any peer already
    /// connected before the first tick must not be diffed against the
    /// default empty set -- that would broadcast a second `CONNECT` for
    /// it on top of the one `start`'s own connected-peer replay already
    /// sent (Section 4.1).
    pub(crate) last_connected_initialized: bool,

    pub(crate) plugins: HashMap<String, Box<dyn TransportPlugin>>,
    pub(crate) neighbours: Box<dyn NeighbourFacade>,
    pub(crate) time_source: Box<dyn TimeSource>,

    pub(crate) config: TransportConfig,
}

impl TransportService {
    pub fn new(
        own_id: PeerIdentity,
        neighbours: Box<dyn NeighbourFacade>,
        time_source: Box<dyn TimeSource>,
        config: TransportConfig,
    ) -> Self {
        Self {
            own_id,
            clients: HashMap::new(),
            next_client_id: 0,
            addresses: HashMap::new(),
            next_ats_handle: 0,
            manipulation: HashMap::new(),
            blacklist_rules: Vec::new(),
            blacklist_pending: HashMap::new(),
            blacklist_init_clients: Vec::new(),
            peer_monitors: Vec::new(),
            validation_monitors: Vec::new(),
            pending_connects: Vec::new(),
            last_connected: HashSet::new(),
            last_connected_initialized: false,
            plugins: HashMap::new(),
            neighbours,
            time_source,
            config,
        }
    }

    pub fn own_id(&self) -> PeerIdentity {
        self.own_id
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.time_source.now_ms()
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn TransportPlugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn register_client(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        self.clients.insert(id, ClientConnection::new());
        id
    }

    pub(crate) fn fresh_ats_handle(&mut self) -> AtsHandle {
        let handle = AtsHandle(self.next_ats_handle);
        self.next_ats_handle += 1;
        handle
    }
}
