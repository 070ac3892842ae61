//! Command implementations.

pub mod dot;
pub mod export;
pub mod lint;
pub mod render;

use anyhow::{Context, Result};
use palisade_compiler::{build_tree, BuildReport};
use palisade_store::{load, LoadWarning, SourceConfig, SymbolStore};

/// Loads every source file and compiles the device tree.
pub(crate) fn load_and_build(
    sources: &SourceConfig,
) -> Result<(SymbolStore, Vec<LoadWarning>, BuildReport)> {
    let (store, warnings) = load(sources).context("Failed to load sources")?;
    let build = build_tree(&store);
    Ok((store, warnings, build))
}
