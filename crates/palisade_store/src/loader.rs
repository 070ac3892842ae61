//! Directory loading: one worker thread per source file.
//!
//! Object files are keyed by the stem before their last `.` and routed on
//! the suffix (`hosts`, `ports`); policy and device files are keyed by
//! their full filename. `.swp` leftovers are skipped during object and
//! policy loading; device files ending `.ignore` are skipped with a notice.

use crate::device::{parse_device, LoadWarning};
use crate::error::{Error, Result};
use crate::store::{StoreBuilder, SymbolStore};
use acl_policy::{parse_hosts, parse_ports, parse_rules};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{debug, info};

/// Source directories for one compilation run.
///
/// Passed explicitly into [`load`]; there is no ambient configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Directory of `<name>.hosts` / `<name>.ports` object files.
    pub objects_dir: PathBuf,
    /// Directory of policy files.
    pub policies_dir: PathBuf,
    /// Directory of device descriptors.
    pub devices_dir: PathBuf,
}

impl SourceConfig {
    /// Creates a config from the three directory paths.
    pub fn new(
        objects_dir: impl Into<PathBuf>,
        policies_dir: impl Into<PathBuf>,
        devices_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            objects_dir: objects_dir.into(),
            policies_dir: policies_dir.into(),
            devices_dir: devices_dir.into(),
        }
    }
}

/// Loads every source file under `config` into a frozen store.
///
/// Files parse concurrently, one worker per file. A failure in any file
/// does not stop its siblings; all failures from the phase are aggregated
/// and the run aborts with [`Error::Aggregate`].
///
/// # Errors
///
/// Returns an error if a source directory is unreadable or any file fails
/// to read or parse.
pub fn load(config: &SourceConfig) -> Result<(SymbolStore, Vec<LoadWarning>)> {
    let object_files = list_files(&config.objects_dir)?;
    let policy_files = list_files(&config.policies_dir)?;
    let device_files = list_files(&config.devices_dir)?;

    let builder = StoreBuilder::new();
    let warnings = Mutex::new(Vec::new());
    let errors = Mutex::new(Vec::new());

    thread::scope(|scope| {
        let builder = &builder;
        let warnings = &warnings;
        let errors = &errors;

        for path in object_files {
            scope.spawn(move || {
                if let Err(err) = load_object(builder, &path) {
                    push(errors, err);
                }
            });
        }
        for path in policy_files {
            scope.spawn(move || {
                if let Err(err) = load_policy(builder, &path) {
                    push(errors, err);
                }
            });
        }
        for path in device_files {
            scope.spawn(move || {
                if let Err(err) = load_device(builder, &path, warnings) {
                    push(errors, err);
                }
            });
        }
    });

    let errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
    if !errors.is_empty() {
        return Err(Error::Aggregate(errors));
    }

    let mut warnings = warnings.into_inner().unwrap_or_else(PoisonError::into_inner);
    warnings.sort_by(|a, b| (&a.path, &a.message).cmp(&(&b.path, &b.message)));

    Ok((builder.freeze(), warnings))
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_object(builder: &StoreBuilder, path: &Path) -> Result<()> {
    let name = file_name(path);
    if name.ends_with(".swp") {
        return Ok(());
    }
    let Some((stem, kind)) = name.rsplit_once('.') else {
        debug!("skipping {}: no object kind suffix", name);
        return Ok(());
    };

    match kind {
        "hosts" => {
            let content = read(path)?;
            let hosts = parse_hosts(&content).map_err(|source| Error::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("loaded host object {} ({} entries)", stem, hosts.entries.len());
            builder.add_host(stem, hosts);
        }
        "ports" => {
            let content = read(path)?;
            let ports = parse_ports(&content).map_err(|source| Error::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("loaded port object {} ({} entries)", stem, ports.entries.len());
            builder.add_port(stem, ports);
        }
        _ => debug!("skipping {}: unrecognized object kind `{}`", name, kind),
    }

    Ok(())
}

fn load_policy(builder: &StoreBuilder, path: &Path) -> Result<()> {
    let name = file_name(path);
    if name.ends_with(".swp") {
        return Ok(());
    }
    let content = read(path)?;
    let rules = parse_rules(&content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded policy {} ({} rules)", name, rules.len());
    builder.add_policy(name, rules);
    Ok(())
}

fn load_device(
    builder: &StoreBuilder,
    path: &Path,
    warnings: &Mutex<Vec<LoadWarning>>,
) -> Result<()> {
    let name = file_name(path);
    if name.ends_with(".ignore") {
        info!("ignoring device file {}", name);
        return Ok(());
    }
    let content = read(path)?;
    let (def, mut file_warnings) = parse_device(path, &content)?;
    if !file_warnings.is_empty() {
        warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&mut file_warnings);
    }
    debug!("loaded device {} ({} includes)", name, def.includes.len());
    builder.add_device(name, def);
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn push(errors: &Mutex<Vec<Error>>, err: Error) {
    errors
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(err);
}
