//! Lint command implementation.

use anyhow::Result;
use chrono::Utc;
use palisade_compiler::LintReport;
use palisade_store::SourceConfig;
use std::time::Instant;
use tracing::info;

/// Runs the lint command.
pub fn run(sources: &SourceConfig, format: &str) -> Result<()> {
    let started = Instant::now();

    let (store, load_warnings, build) = super::load_and_build(sources)?;

    info!("Loaded {} hosts", store.hosts().len());
    info!("Loaded {} ports", store.ports().len());
    info!("Loaded {} policies", store.policies().len());
    info!("Loaded {} devices", store.devices().len());

    let today = Utc::now().date_naive();
    let report = LintReport::new(&store, load_warnings, &build, today);

    match format.to_lowercase().as_str() {
        "text" => print!("{report}"),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            anyhow::bail!("Unknown report format: {format}. Use 'text' or 'json'.");
        }
    }

    info!("lint took {:?}", started.elapsed());

    if report.has_failures() {
        anyhow::bail!("{} device(s) failed to compile", report.failures.len());
    }

    Ok(())
}
