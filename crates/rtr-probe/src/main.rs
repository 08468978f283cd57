//! RTR Probe
//!
//! Connects to one configured RPKI cache over SSH, reports whether the
//! transport came up and how it identifies itself, then disconnects.

use anyhow::{bail, Context, Result};
use rtr_transport::{CacheConfig, CacheSession};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// Outcome of one probe
#[derive(Debug, Serialize)]
struct ProbeReport {
    session: Uuid,
    ident: Option<String>,
    connected: bool,
}

fn config_path() -> Result<PathBuf> {
    match std::env::args_os().nth(1) {
        Some(path) => Ok(PathBuf::from(path)),
        None => bail!("usage: rtr-probe <cache-config.json>"),
    }
}

fn probe(config: CacheConfig) -> Result<ProbeReport> {
    if config.ssh.is_none() {
        bail!("{}:{} has no ssh section", config.hostname, config.port);
    }

    let mut session = CacheSession::new(config);
    let connected = session.open().is_ok();
    let ident = session.identify().map(str::to_string);

    if connected {
        info!("Transport {} is up", ident.as_deref().unwrap_or("<unknown>"));
    } else {
        error!("Transport {} failed to open", ident.as_deref().unwrap_or("<unknown>"));
    }

    session.close();
    session.free_transport();

    Ok(ProbeReport {
        session: session.id(),
        ident,
        connected,
    })
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = config_path()?;
    let config = CacheConfig::from_json_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let report = probe(config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.connected {
        std::process::exit(1);
    }
    Ok(())
}
