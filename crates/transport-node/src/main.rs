//! Transport node binary.
//!
//! Wires a [`qc_18_transport_core::Scheduler`] to its reference adapters
//! and runs the single-threaded scheduling loop. Real wire-transport
//! plugins and a real client socket listener are out of scope for this
//! crate (SPEC_FULL.md Section 1 keeps the neighbour and plugin
//! subsystems interface-only); this binary exists to give the core a
//! runnable home and a place for an operator to point a config file at.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use qc_18_transport_core::adapters::{InMemoryNeighbours, StaticConfigProvider, SystemTimeSource};
use qc_18_transport_core::domain::TransportConfig;
use qc_18_transport_core::ports::{ClientTransport, ConfigProvider};
use qc_18_transport_core::{ClientId, PeerIdentity, Scheduler, TransportService};

#[derive(Parser, Debug)]
#[command(name = "transport-node", about = "Transport service core scheduler")]
struct Args {
    /// Path to a transport.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// This node's own identity, as 64 hex characters. Defaults to the
    /// all-zero placeholder identity when omitted.
    #[arg(long)]
    self_id: Option<String>,
}

/// Logs every client-bound frame instead of writing to a real socket.
struct LoggingTransport;

#[async_trait(?Send)]
impl ClientTransport for LoggingTransport {
    async fn write_frame(&mut self, client: ClientId, frame: &[u8]) {
        info!(?client, bytes = frame.len(), "would write frame to client socket");
    }

    async fn disconnect(&mut self, client: ClientId) {
        info!(?client, "would close client socket");
    }
}

fn load_config(args: &Args) -> TransportConfig {
    #[cfg(feature = "config")]
    if let Some(path) = &args.config {
        match qc_18_transport_core::adapters::TomlConfigProvider::load(path) {
            Ok(provider) => return provider.load(),
            Err(err) => {
                tracing::warn!(%err, "failed to load config file, falling back to defaults");
            }
        }
    }
    let _ = args;
    StaticConfigProvider::new(TransportConfig::default()).load()
}

fn parse_self_id(raw: &str) -> Option<PeerIdentity> {
    if raw.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in raw.as_bytes().chunks(2).enumerate() {
        let s = std::str::from_utf8(chunk).ok()?;
        bytes[i] = u8::from_str_radix(s, 16).ok()?;
    }
    Some(PeerIdentity::new(bytes))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(&args);
    let own_id = args
        .self_id
        .as_deref()
        .and_then(parse_self_id)
        .unwrap_or_else(PeerIdentity::wildcard);

    info!(?own_id, plugins = ?config.plugins, "starting transport node");
    if config.has_no_plugins() {
        tracing::warn!("no transport plugins configured; running in a degraded state");
    }

    let service = TransportService::new(
        own_id,
        Box::new(InMemoryNeighbours::new()),
        Box::new(SystemTimeSource::new()),
        config,
    );
    let mut scheduler = Scheduler::new(service, LoggingTransport);

    let local = tokio::task::LocalSet::new();
    local.run_until(scheduler.run_forever()).await;
    Ok(())
}
