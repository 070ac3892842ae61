//! Vendor renderers and tree export.
//!
//! Each vendor gets its own emitter; [`render_device`] dispatches on the
//! device's vendor tag. [`render_graph`] emits a Graphviz view of one
//! device's reference structure regardless of vendor.

mod graph;
mod ios;
mod junos;

use crate::error::{Error, Result};
use crate::tree::{CompiledDevice, CompiledTree};

/// Serialization format for tree export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Renders one device's configuration in its vendor's syntax.
///
/// # Errors
///
/// Returns [`Error::UnknownVendor`] for a vendor tag no renderer covers,
/// or a renderer error for input it cannot express.
pub fn render_device(name: &str, device: &CompiledDevice) -> Result<String> {
    match device.vendor.as_str() {
        "junos" => Ok(junos::render(name, device)),
        "ios" => ios::render(name, device),
        vendor => Err(Error::UnknownVendor {
            vendor: vendor.to_string(),
        }),
    }
}

/// Renders one device's reference structure as a Graphviz digraph.
#[must_use]
pub fn render_graph(name: &str, device: &CompiledDevice) -> String {
    graph::render(name, device)
}

/// Serializes the whole compiled tree.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn export_tree(tree: &CompiledTree, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(tree)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(tree)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn bare_device(vendor: &str) -> CompiledDevice {
        CompiledDevice {
            vendor: vendor.to_string(),
            transport: "ssh".to_string(),
            persist: false,
            timeout: Duration::from_secs(10),
            host_groups: BTreeMap::new(),
            rules: BTreeMap::new(),
        }
    }

    #[test]
    fn unknown_vendors_are_rejected() {
        let device = bare_device("acme");
        let err = render_device("fw1.ams", &device).unwrap_err();
        assert!(matches!(err, Error::UnknownVendor { vendor } if vendor == "acme"));
    }

    #[test]
    fn known_vendors_dispatch() {
        assert!(render_device("fw1.ams", &bare_device("junos")).is_ok());
        assert!(render_device("fw1.ams", &bare_device("ios")).is_ok());
    }

    #[test]
    fn empty_tree_exports_in_both_formats() {
        let tree = CompiledTree::default();
        assert_eq!(export_tree(&tree, OutputFormat::Json).unwrap(), "{\n  \"devices\": {}\n}");
        assert_eq!(export_tree(&tree, OutputFormat::Yaml).unwrap(), "devices: {}\n");
    }
}
