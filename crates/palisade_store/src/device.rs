//! Device descriptors: `key value` files describing one network device.
//!
//! Recognized keys are `vendor`, `transport`, `save_config`, `timeout`
//! (seconds), and `include` (repeatable, appends a policy name). Unknown
//! keys are collected as warnings rather than failing the file.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Parsed device descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDef {
    /// Vendor tag selecting the render template set.
    pub vendor: String,
    /// Management transport (`ssh`, `netconf`, ...).
    pub transport: String,
    /// Whether the device persists its config after apply.
    pub persist: bool,
    /// Command timeout.
    pub timeout: Duration,
    /// Included policy names, in declaration order.
    pub includes: Vec<String>,
}

impl Default for DeviceDef {
    fn default() -> Self {
        Self {
            vendor: String::new(),
            transport: String::new(),
            persist: false,
            timeout: Duration::ZERO,
            includes: Vec::new(),
        }
    }
}

/// Non-fatal diagnostic produced while loading sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    /// File the warning came from.
    pub path: String,
    /// What was wrong.
    pub message: String,
}

/// Parses a device descriptor.
///
/// `path` is used for diagnostics only; the caller supplies the content.
///
/// # Errors
///
/// Returns an error when a recognized key has no value, `save_config` is
/// not a boolean, or `timeout` is not a whole number of seconds.
pub fn parse_device(path: &Path, input: &str) -> Result<(DeviceDef, Vec<LoadWarning>)> {
    let mut def = DeviceDef::default();
    let mut warnings = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = match line.split_once(' ') {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };

        match key {
            "vendor" => def.vendor = required(path, key, value)?.to_string(),
            "transport" => def.transport = required(path, key, value)?.to_string(),
            "save_config" => def.persist = parse_bool(path, key, required(path, key, value)?)?,
            "timeout" => {
                let value = required(path, key, value)?;
                let secs: u64 = value.parse().map_err(|_| Error::InvalidValue {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                def.timeout = Duration::from_secs(secs);
            }
            "include" => def.includes.push(required(path, key, value)?.to_string()),
            _ => {
                warn!("{}: unknown key `{}`", path.display(), key);
                warnings.push(LoadWarning {
                    path: path.display().to_string(),
                    message: format!("unknown key `{key}`"),
                });
            }
        }
    }

    Ok((def, warnings))
}

fn required<'a>(path: &Path, key: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::MissingValue {
            path: path.to_path_buf(),
            key: key.to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(path: &Path, key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(Error::InvalidValue {
            path: path.to_path_buf(),
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
