//! Adapters layer: concrete implementations of the ports traits.
//!
//! Reference: SPEC_FULL.md Section 2 and the `[AMBIENT]`/`[SUPPLEMENT]`
//! notes in Sections 4 and 6.

pub mod clock;
pub mod config_toml;
pub mod neighbour;

#[cfg(feature = "test-utils")]
pub mod plugin_noop;

pub use clock::{FixedTimeSource, SystemTimeSource};
pub use config_toml::StaticConfigProvider;
pub use neighbour::InMemoryNeighbours;

#[cfg(feature = "config")]
pub use config_toml::{ConfigError, TomlConfigProvider};

#[cfg(feature = "test-utils")]
pub use plugin_noop::InMemoryPlugin;
