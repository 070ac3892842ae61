//! Render command implementation.

use anyhow::{Context, Result};
use palisade_compiler::{render_device, BuildReport};
use palisade_store::SourceConfig;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs the render command.
///
/// Devices render concurrently, each to `<output_dir>/<name>.out`. With
/// an explicit device list only those devices count toward the exit
/// status; with `all`, a device that failed to compile fails the run.
pub fn run(sources: &SourceConfig, devices: &[String], output_dir: &str) -> Result<()> {
    let started = Instant::now();

    let (_store, _warnings, build) = super::load_and_build(sources)?;

    for failure in &build.failures {
        warn!("Device {} failed to compile: {}", failure.device, failure.error);
    }

    let render_all = devices.first().is_some_and(|first| first == "all");
    let selected: Vec<&str> = if render_all {
        build.tree.devices.keys().map(String::as_str).collect()
    } else {
        devices.iter().map(String::as_str).collect()
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {output_dir}"))?;

    let problems = Mutex::new(Vec::new());

    thread::scope(|scope| {
        let build = &build;
        let problems = &problems;

        for name in selected {
            scope.spawn(move || {
                if let Err(err) = render_one(build, name, output_dir) {
                    problems
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(format!("{name}: {err:#}"));
                }
            });
        }
    });

    let mut problems = problems.into_inner().unwrap_or_else(PoisonError::into_inner);
    if render_all {
        problems.extend(
            build
                .failures
                .iter()
                .map(|failure| format!("{}: {}", failure.device, failure.error)),
        );
    }
    problems.sort();

    info!("render took {:?}", started.elapsed());

    if !problems.is_empty() {
        for problem in &problems {
            error!("{}", problem);
        }
        anyhow::bail!("{} device(s) failed", problems.len());
    }

    Ok(())
}

fn render_one(build: &BuildReport, name: &str, output_dir: &str) -> Result<()> {
    let Some(device) = build.tree.devices.get(name) else {
        if let Some(failure) = build.failures.iter().find(|failure| failure.device == name) {
            anyhow::bail!("failed to compile: {}", failure.error);
        }
        anyhow::bail!("Unknown device: {name}");
    };

    let config = render_device(name, device)?;
    let path = Path::new(output_dir).join(format!("{name}.out"));
    fs::write(&path, config).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Rendered {} to {}", name, path.display());
    Ok(())
}
