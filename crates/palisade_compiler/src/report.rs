//! Lint reporting over a loaded store and a finished tree build.

use crate::tree::{BuildReport, BuildWarning};
use acl_policy::HostEntry;
use chrono::NaiveDate;
use palisade_store::{LoadWarning, SymbolStore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A rule kept past its expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiredRule {
    /// Policy the rule lives in.
    pub policy: String,
    /// Position within the policy, starting at 1.
    pub rule: usize,
    /// The date the rule expired on.
    pub expired_on: NaiveDate,
}

/// Summary of one lint run.
///
/// Everything in here is sorted, so two runs over the same sources
/// produce identical reports.
#[derive(Debug, Serialize)]
pub struct LintReport {
    /// Host objects loaded.
    pub hosts: usize,
    /// Port objects loaded.
    pub ports: usize,
    /// Policies loaded.
    pub policies: usize,
    /// Devices loaded.
    pub devices: usize,
    /// Devices that compiled cleanly.
    pub compiled_devices: usize,
    /// Per-device compile failures, rendered as text.
    pub failures: Vec<String>,
    /// Warnings recorded while loading source files.
    pub load_warnings: Vec<LoadWarning>,
    /// Warnings recorded while compiling devices.
    pub build_warnings: Vec<BuildWarning>,
    /// Host objects no compiled device reaches, directly or through
    /// nested groups.
    pub unreferenced_hosts: Vec<String>,
    /// Rules whose expiry date lies before the reference date.
    pub expired_rules: Vec<ExpiredRule>,
}

impl LintReport {
    /// Builds a report from a loaded store and its tree build.
    ///
    /// `today` is the reference date for expiry checks; injecting it
    /// keeps the report reproducible.
    #[must_use]
    pub fn new(
        store: &SymbolStore,
        load_warnings: Vec<LoadWarning>,
        build: &BuildReport,
        today: NaiveDate,
    ) -> Self {
        let failures = build
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.device, failure.error))
            .collect();

        Self {
            hosts: store.hosts().len(),
            ports: store.ports().len(),
            policies: store.policies().len(),
            devices: store.devices().len(),
            compiled_devices: build.tree.devices.len(),
            failures,
            load_warnings,
            build_warnings: build.warnings.clone(),
            unreferenced_hosts: unreferenced_hosts(store, build),
            expired_rules: expired_rules(store, today),
        }
    }

    /// True when at least one device failed to compile.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "hosts: {}", self.hosts)?;
        writeln!(f, "ports: {}", self.ports)?;
        writeln!(f, "policies: {}", self.policies)?;
        writeln!(f, "devices: {}", self.devices)?;
        writeln!(f, "compiled: {}/{} devices", self.compiled_devices, self.devices)?;
        for failure in &self.failures {
            writeln!(f, "failure: {}", failure)?;
        }
        for warning in &self.load_warnings {
            writeln!(f, "load warning: {}: {}", warning.path, warning.message)?;
        }
        for warning in &self.build_warnings {
            writeln!(f, "build warning: {}: {}", warning.device, warning.message)?;
        }
        for host in &self.unreferenced_hosts {
            writeln!(f, "unreferenced host: {}", host)?;
        }
        for expired in &self.expired_rules {
            writeln!(
                f,
                "expired rule: {} #{} ({})",
                expired.policy,
                expired.rule,
                expired.expired_on.format("%Y%m%d")
            )?;
        }
        Ok(())
    }
}

/// Host objects nothing reaches from a compiled device.
///
/// Reachability starts at every group a device's rules reference and
/// follows nested group entries, so a host object used only inside
/// another object still counts as referenced.
fn unreferenced_hosts(store: &SymbolStore, build: &BuildReport) -> Vec<String> {
    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    let mut queue: Vec<&str> = build
        .tree
        .devices
        .values()
        .flat_map(|device| device.host_groups.keys())
        .map(String::as_str)
        .collect();

    while let Some(name) = queue.pop() {
        if !referenced.insert(name) {
            continue;
        }
        if let Some(object) = store.host(name) {
            for entry in &object.entries {
                if let HostEntry::Group(group) = entry {
                    queue.push(group);
                }
            }
        }
    }

    let mut unreferenced: Vec<String> = store
        .hosts()
        .keys()
        .filter(|name| !referenced.contains(name.as_str()))
        .cloned()
        .collect();
    unreferenced.sort();
    unreferenced
}

fn expired_rules(store: &SymbolStore, today: NaiveDate) -> Vec<ExpiredRule> {
    let mut expired = Vec::new();
    for (name, policy) in store.policies() {
        for (index, rule) in policy.rules.iter().enumerate() {
            if let Some(date) = rule.expire.filter(|date| *date < today) {
                expired.push(ExpiredRule {
                    policy: name.clone(),
                    rule: index + 1,
                    expired_on: date,
                });
            }
        }
    }
    expired.sort_by(|a, b| (&a.policy, a.rule).cmp(&(&b.policy, b.rule)));
    expired
}
