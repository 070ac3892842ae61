//! Export command implementation.

use anyhow::Result;
use palisade_compiler::{export_tree, OutputFormat};
use palisade_store::SourceConfig;
use std::time::Instant;
use tracing::{error, info};

/// Runs the export command.
///
/// Exports only a clean tree: a device that failed to compile makes the
/// export fail rather than silently shipping a partial tree.
pub fn run(sources: &SourceConfig, format: &str) -> Result<()> {
    let format = match format.to_lowercase().as_str() {
        "json" => OutputFormat::Json,
        "yaml" | "yml" => OutputFormat::Yaml,
        _ => {
            anyhow::bail!("Unknown output format: {format}. Use 'json' or 'yaml'.");
        }
    };

    let start = Instant::now();
    let (_store, _warnings, build) = super::load_and_build(sources)?;

    if !build.is_clean() {
        for failure in &build.failures {
            error!("{}: {}", failure.device, failure.error);
        }
        anyhow::bail!("{} device(s) failed to compile", build.failures.len());
    }

    let output = export_tree(&build.tree, format)?;
    println!("{}", output.trim_end());
    info!("export took {:?}", start.elapsed());
    Ok(())
}
