//! Transport configuration values.
//!
//! Reference: SPEC_FULL.md Section 6 ("Environment") — `[AMBIENT]`.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::client::MAX_PENDING;

/// Configuration recognised by the transport core. Read through the
/// [`crate::ports::outbound::ConfigProvider`] port; this type itself has
/// no knowledge of where the values came from.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `transport.plugins` — space-separated plugin names in the raw
    /// config file, already split here.
    pub plugins: Vec<String>,
    /// `transport.MANIPULATE_DELAY_IN`.
    pub manipulate_delay_in: Duration,
    /// `transport.MANIPULATE_DELAY_OUT`.
    pub manipulate_delay_out: Duration,
    /// `topology.FRIENDS` — consumed outside this crate; kept here only
    /// so a single config load populates the whole process.
    pub friends_file: Option<PathBuf>,
    /// Soft cap on a client's pending outbound queue.
    pub max_pending: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            manipulate_delay_in: Duration::ZERO,
            manipulate_delay_out: Duration::ZERO,
            friends_file: None,
            max_pending: MAX_PENDING,
        }
    }
}

impl TransportConfig {
    /// A missing `transport.plugins` list is logged and the service
    /// continues in a degraded state (Section 7), never treated as
    /// fatal; this just reports whether that degraded state applies.
    pub fn has_no_plugins(&self) -> bool {
        self.plugins.is_empty()
    }
}
