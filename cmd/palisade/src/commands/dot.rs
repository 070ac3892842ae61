//! Dot command implementation.

use anyhow::{Context, Result};
use palisade_compiler::render_graph;
use palisade_store::SourceConfig;
use std::time::Instant;
use tracing::info;

/// Runs the dot command.
pub fn run(sources: &SourceConfig, device: &str) -> Result<()> {
    let start = Instant::now();
    let (_store, _warnings, build) = super::load_and_build(sources)?;

    if let Some(failure) = build.failures.iter().find(|failure| failure.device == device) {
        anyhow::bail!("Device {} failed to compile: {}", failure.device, failure.error);
    }

    let compiled = build
        .tree
        .devices
        .get(device)
        .with_context(|| format!("Unknown device: {device}"))?;

    print!("{}", render_graph(device, compiled));
    info!("dot took {:?}", start.elapsed());
    Ok(())
}
