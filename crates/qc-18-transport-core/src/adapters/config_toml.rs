//! Configuration providers.
//!
//! `StaticConfigProvider` is always available for tests and
//! hand-wired setups; `TomlConfigProvider` (behind the `config`
//! feature) reads the recognised keys from a TOML file, grounded on
//! `qc-01-peer-discovery`'s `TomlConfigProvider`/`StaticConfigProvider`
//! split.

use crate::domain::config::TransportConfig;
use crate::ports::outbound::ConfigProvider;

/// Hardcoded configuration, useful for tests and for binaries that
/// build their own `TransportConfig` by hand.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: TransportConfig,
}

impl StaticConfigProvider {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> TransportConfig {
        self.config.clone()
    }
}

#[cfg(feature = "config")]
mod toml_config {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Default)]
    struct ConfigFile {
        #[serde(default)]
        transport: TransportSection,
        #[serde(default)]
        topology: TopologySection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct TransportSection {
        plugins: Option<String>,
        manipulate_delay_in_ms: Option<u64>,
        manipulate_delay_out_ms: Option<u64>,
        max_pending: Option<usize>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct TopologySection {
        friends: Option<String>,
    }

    /// TOML-backed [`ConfigProvider`], reading the `[transport]` and
    /// `[topology]` sections documented in SPEC_FULL.md Section 6.
    pub struct TomlConfigProvider {
        config: TransportConfig,
    }

    impl TomlConfigProvider {
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;
            Self::parse(&content)
        }

        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let plugins = file
                .transport
                .plugins
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();

            let config = TransportConfig {
                plugins,
                manipulate_delay_in: Duration::from_millis(file.transport.manipulate_delay_in_ms.unwrap_or(0)),
                manipulate_delay_out: Duration::from_millis(
                    file.transport.manipulate_delay_out_ms.unwrap_or(0),
                ),
                friends_file: file.topology.friends.map(PathBuf::from),
                max_pending: file
                    .transport
                    .max_pending
                    .unwrap_or(crate::domain::client::MAX_PENDING),
            };

            Ok(Self { config })
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn load(&self) -> TransportConfig {
            self.config.clone()
        }
    }

    #[derive(Debug, Clone)]
    pub enum ConfigError {
        Io { path: String, error: String },
        Parse(String),
    }

    impl std::fmt::Display for ConfigError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Io { path, error } => write!(f, "failed to read {path}: {error}"),
                Self::Parse(e) => write!(f, "failed to parse transport config: {e}"),
            }
        }
    }

    impl std::error::Error for ConfigError {}
}

#[cfg(feature = "config")]
pub use toml_config::{ConfigError, TomlConfigProvider};

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn parses_plugin_list_and_delays() {
        let toml = r#"
            [transport]
            plugins = "tcp udp"
            manipulate_delay_in_ms = 10
            manipulate_delay_out_ms = 20
        "#;
        let provider = TomlConfigProvider::parse(toml).unwrap();
        let config = provider.load();
        assert_eq!(config.plugins, vec!["tcp", "udp"]);
        assert_eq!(config.manipulate_delay_in.as_millis(), 10);
        assert_eq!(config.manipulate_delay_out.as_millis(), 20);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let provider = TomlConfigProvider::parse("").unwrap();
        let config = provider.load();
        assert!(config.plugins.is_empty());
        assert_eq!(config.max_pending, crate::domain::client::MAX_PENDING);
    }
}
