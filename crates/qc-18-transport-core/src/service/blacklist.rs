//! Blacklist arbiter: static rules plus the async client-query protocol.
//!
//! Reference: SPEC_FULL.md Section 4.4. A decision is "allow" unless
//! something actively vetoes it: a matching static rule, or any
//! `BLACKLIST_INIT` client replying `BLACKLIST_REPLY{is_allowed=false}`
//! before the query's deadline (a silent/unresponsive client does not
//! block the connection — Open Question resolved in SPEC_FULL.md
//! Section 9).

use std::collections::HashSet;

use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::blacklist::BlacklistRule;
use crate::domain::client::ClientId;
use crate::domain::errors::BlacklistError;
use crate::domain::identity::PeerIdentity;
use crate::ports::outbound::TimeSource;
use crate::wire::ClientMessage;

use super::core::TransportService;

/// How long an outstanding `BLACKLIST_QUERY` waits for all subscribed
/// clients to reply before defaulting to "allow".
pub const QUERY_TIMEOUT_MS: u64 = 5_000;

pub(crate) struct PendingBlacklistQuery {
    transport_name: String,
    awaiting: HashSet<ClientId>,
    deadline_ms: u64,
    waiters: Vec<oneshot::Sender<bool>>,
}

impl TransportService {
    pub fn add_blacklist_rule(&mut self, rule: BlacklistRule) {
        if !self.blacklist_rules.contains(&rule) {
            self.blacklist_rules.push(rule);
        }
    }

    pub fn is_statically_blacklisted(&self, peer: PeerIdentity, transport_name: &str) -> bool {
        self.blacklist_rules
            .iter()
            .any(|rule| rule.matches(peer, transport_name))
    }

    pub fn blacklist_init(&mut self, client: ClientId) {
        if !self.blacklist_init_clients.contains(&client) {
            self.blacklist_init_clients.push(client);
        }
    }

    /// Begin (or join) an async allow/deny decision for `peer` over
    /// `transport_name`. Returns a receiver that resolves once the
    /// decision is known; the caller (the `REQUEST_CONNECT` handler)
    /// resolves it non-blockingly across scheduler turns rather than
    /// awaiting it inline (Section 5).
    pub fn test_allowed(&mut self, peer: PeerIdentity, transport_name: &str) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();

        if self.is_statically_blacklisted(peer, transport_name) {
            let _ = tx.send(false);
            return rx;
        }

        if self.blacklist_init_clients.is_empty() {
            let _ = tx.send(true);
            return rx;
        }

        // Only issue a fresh BLACKLIST_QUERY the first time a peer is
        // decided; a second `test_allowed` call for the same peer while
        // one is already outstanding just joins its existing waiters
        // instead of re-asking deciders who may have already replied.
        if !self.blacklist_pending.contains_key(&peer) {
            let awaiting: HashSet<ClientId> = self.blacklist_init_clients.iter().copied().collect();
            let deadline_ms = self.time_source.now_ms() + QUERY_TIMEOUT_MS;
            self.blacklist_pending.insert(
                peer,
                PendingBlacklistQuery {
                    transport_name: transport_name.to_string(),
                    awaiting,
                    deadline_ms,
                    waiters: Vec::new(),
                },
            );

            // Section 4.4: "issue a BLACKLIST_QUERY{peer, transport_name}
            // to every registered blacklist client and wait for each to
            // reply."
            let transport_name = self.blacklist_pending[&peer].transport_name.clone();
            let deciders = self.blacklist_init_clients.clone();
            for client in deciders {
                let msg = ClientMessage::BlacklistQuery {
                    peer,
                    transport_name: transport_name.clone(),
                };
                self.send_to_client(client, &msg, false);
            }
        }

        let query = self.blacklist_pending.get_mut(&peer).expect("just inserted or already present");
        query.waiters.push(tx);
        rx
    }

    /// A `BLACKLIST_REPLY` from a client. A single `false` vetoes the
    /// connection immediately; once every subscribed client has replied
    /// without a veto, the query resolves to "allow".
    pub fn blacklist_reply(
        &mut self,
        client: ClientId,
        peer: PeerIdentity,
        is_allowed: bool,
    ) -> Result<(), BlacklistError> {
        let query = self
            .blacklist_pending
            .get_mut(&peer)
            .ok_or(BlacklistError::NoOutstandingQuery { peer })?;

        if !is_allowed {
            debug!(?peer, ?client, "blacklist veto received");
            let query = self.blacklist_pending.remove(&peer).unwrap();
            for tx in query.waiters {
                let _ = tx.send(false);
            }
            return Ok(());
        }

        query.awaiting.remove(&client);
        if query.awaiting.is_empty() {
            let query = self.blacklist_pending.remove(&peer).unwrap();
            for tx in query.waiters {
                let _ = tx.send(true);
            }
        }
        Ok(())
    }

    /// A blacklist-decider client disconnected. Section 4.4: "a
    /// blacklist client that disconnects mid-query is treated as allow
    /// for its pending queries" -- it is simply dropped from every
    /// query's `awaiting` set, same as an on-time `allow` reply would,
    /// so queries that were only waiting on it resolve immediately
    /// instead of sitting until [`Self::expire_blacklist_queries`] times
    /// them out.
    pub(crate) fn blacklist_client_disconnected(&mut self, client: ClientId) {
        let resolved: Vec<PeerIdentity> = self
            .blacklist_pending
            .iter_mut()
            .filter_map(|(peer, query)| {
                query.awaiting.remove(&client);
                query.awaiting.is_empty().then_some(*peer)
            })
            .collect();
        for peer in resolved {
            if let Some(query) = self.blacklist_pending.remove(&peer) {
                for tx in query.waiters {
                    let _ = tx.send(true);
                }
            }
        }
    }

    /// Resolve any queries whose deadline has passed as "allow" (a
    /// client that never answers cannot veto forever).
    pub(crate) fn expire_blacklist_queries(&mut self, now_ms: u64) {
        let expired: Vec<PeerIdentity> = self
            .blacklist_pending
            .iter()
            .filter(|(_, q)| q.deadline_ms <= now_ms)
            .map(|(peer, _)| *peer)
            .collect();
        for peer in expired {
            if let Some(query) = self.blacklist_pending.remove(&peer) {
                for tx in query.waiters {
                    let _ = tx.send(true);
                }
            }
        }
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

    #[tokio::test]
    async fn static_rule_vetoes_without_any_client_query() {
        let mut svc = service();
        let peer = PeerIdentity::new([1u8; 32]);
        svc.add_blacklist_rule(BlacklistRule::peer_wide(peer));
        let rx = svc.test_allowed(peer, "tcp");
        assert_eq!(rx.await.unwrap(), false);
    }

    #[tokio::test]
    async fn no_subscribers_defaults_to_allow() {
        let mut svc = service();
        let peer = PeerIdentity::new([2u8; 32]);
        let rx = svc.test_allowed(peer, "tcp");
        assert_eq!(rx.await.unwrap(), true);
    }

    #[tokio::test]
    async fn single_veto_wins_over_pending_allows() {
        let mut svc = service();
        let peer = PeerIdentity::new([3u8; 32]);
        svc.blacklist_init(ClientId(0));
        svc.blacklist_init(ClientId(1));
        let rx = svc.test_allowed(peer, "tcp");
        svc.blacklist_reply(ClientId(0), peer, false).unwrap();
        assert_eq!(rx.await.unwrap(), false);
    }

    #[tokio::test]
    async fn all_clients_allowing_resolves_allow() {
        let mut svc = service();
        let peer = PeerIdentity::new([4u8; 32]);
        svc.blacklist_init(ClientId(0));
        svc.blacklist_init(ClientId(1));
        let rx = svc.test_allowed(peer, "tcp");
        svc.blacklist_reply(ClientId(0), peer, true).unwrap();
        svc.blacklist_reply(ClientId(1), peer, true).unwrap();
        assert_eq!(rx.await.unwrap(), true);
    }

    #[test]
    fn reply_without_outstanding_query_is_an_error() {
        let mut svc = service();
        let peer = PeerIdentity::new([5u8; 32]);
        let err = svc.blacklist_reply(ClientId(0), peer, true).unwrap_err();
        assert!(matches!(err, BlacklistError::NoOutstandingQuery { .. }));
    }

    #[tokio::test]
    async fn disconnecting_decider_resolves_queries_only_waiting_on_it() {
        let mut svc = service();
        let peer = PeerIdentity::new([7u8; 32]);
        svc.blacklist_init(ClientId(0));
        svc.blacklist_init(ClientId(1));
        let rx = svc.test_allowed(peer, "tcp");

        svc.blacklist_client_disconnected(ClientId(0));
        // Still one decider outstanding.
        assert!(svc.blacklist_pending.contains_key(&peer));

        svc.blacklist_client_disconnected(ClientId(1));
        assert_eq!(rx.await.unwrap(), true);
        assert!(!svc.blacklist_pending.contains_key(&peer));
    }

    #[tokio::test]
    async fn unanswered_query_expires_as_allow() {
        let mut svc = service();
        let peer = PeerIdentity::new([6u8; 32]);
        svc.blacklist_init(ClientId(0));
        let rx = svc.test_allowed(peer, "tcp");
        svc.expire_blacklist_queries(QUERY_TIMEOUT_MS + 1);
        assert_eq!(rx.await.unwrap(), true);
    }
}
