//! Per-device compilation and the parallel tree build.
//!
//! Compilation turns a device's included policies into render-ready rules:
//! protocol aliases expand, port tokens become numbers, host groups
//! flatten into the device's group table. Devices compile independently,
//! so one broken device reports a failure instead of sinking the run.

use crate::error::{Error, Result};
use crate::resolve::{resolve_hosts, resolve_ports};
use crate::services::{expand_protocol, lookup_port};
use acl_policy::{Action, PortSpec, Rule, Target};
use ipnet::Ipv4Net;
use palisade_store::{DeviceDef, SymbolStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Address side of a compiled rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Matches any address.
    Any,
    /// One literal IPv4 subnet.
    Subnet(Ipv4Net),
    /// Named host group, expanded in the device's group table.
    Group(String),
}

/// A rule after reference resolution, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    /// Allow or deny.
    pub action: Action,
    /// Concrete protocols, aliases already expanded.
    pub protocols: Vec<String>,
    /// Match established connections only.
    pub established: bool,
    /// Log matching traffic.
    pub log: bool,
    /// Mirror matching traffic.
    pub mirror: bool,
    /// Source address constraint.
    pub source: Endpoint,
    /// Numeric source port tokens; empty means unconstrained.
    pub source_ports: Vec<String>,
    /// Destination address constraint.
    pub destination: Endpoint,
    /// Numeric destination port tokens; empty means unconstrained.
    pub destination_ports: Vec<String>,
}

/// One device with every included policy compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledDevice {
    /// Vendor tag selecting the render template set.
    pub vendor: String,
    /// Management transport.
    pub transport: String,
    /// Whether the device persists its config after apply.
    pub persist: bool,
    /// Command timeout.
    pub timeout: Duration,
    /// Host groups referenced by this device's rules, fully expanded.
    pub host_groups: BTreeMap<String, Vec<String>>,
    /// Compiled rules keyed by the policy that produced them.
    pub rules: BTreeMap<String, Vec<CompiledRule>>,
}

/// The compiled tree: one entry per device that compiled cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompiledTree {
    /// Compiled devices by name.
    pub devices: BTreeMap<String, CompiledDevice>,
}

/// A device that failed to compile, with the error that stopped it.
#[derive(Debug)]
pub struct DeviceFailure {
    /// Device name.
    pub device: String,
    /// What went wrong.
    pub error: Error,
}

/// A non-fatal message recorded while compiling one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    /// Device the message belongs to.
    pub device: String,
    /// What was observed.
    pub message: String,
}

/// Everything a tree build produces.
#[derive(Debug)]
pub struct BuildReport {
    /// Devices that compiled cleanly.
    pub tree: CompiledTree,
    /// Devices that did not, sorted by name.
    pub failures: Vec<DeviceFailure>,
    /// Non-fatal messages, sorted by device then message.
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    /// True when every device compiled.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compiles every device in the store, one worker thread per device.
///
/// Failures and warnings come back sorted so output is stable run to run.
#[must_use]
pub fn build_tree(store: &SymbolStore) -> BuildReport {
    let devices = Mutex::new(BTreeMap::new());
    let failures = Mutex::new(Vec::new());
    let warnings = Mutex::new(Vec::new());

    thread::scope(|scope| {
        let devices = &devices;
        let failures = &failures;
        let warnings = &warnings;

        for (name, def) in store.devices() {
            scope.spawn(move || {
                let mut messages = Vec::new();
                match compile_device(store, def, &mut messages) {
                    Ok(compiled) => {
                        debug!("compiled device {}", name);
                        devices
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(name.clone(), compiled);
                    }
                    Err(error) => {
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(DeviceFailure {
                                device: name.clone(),
                                error,
                            });
                    }
                }
                if !messages.is_empty() {
                    warnings
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(messages.into_iter().map(|message| BuildWarning {
                            device: name.clone(),
                            message,
                        }));
                }
            });
        }
    });

    let devices = devices.into_inner().unwrap_or_else(PoisonError::into_inner);
    let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
    let mut warnings = warnings.into_inner().unwrap_or_else(PoisonError::into_inner);
    failures.sort_by(|a, b| a.device.cmp(&b.device));
    warnings.sort_by(|a, b| (&a.device, &a.message).cmp(&(&b.device, &b.message)));

    BuildReport {
        tree: CompiledTree { devices },
        failures,
        warnings,
    }
}

/// Compiles the policies one device includes.
///
/// Each host group a rule references resolves once per device and lands
/// in the device's group table; rules refer to it by name.
///
/// # Errors
///
/// Returns an error on an unknown policy, an unresolvable port, an
/// invalid address literal, or a reference cycle. The error is scoped to
/// this device; other devices are unaffected.
pub fn compile_device(
    store: &SymbolStore,
    def: &DeviceDef,
    warnings: &mut Vec<String>,
) -> Result<CompiledDevice> {
    let mut device = CompiledDevice {
        vendor: def.vendor.clone(),
        transport: def.transport.clone(),
        persist: def.persist,
        timeout: def.timeout,
        host_groups: BTreeMap::new(),
        rules: BTreeMap::new(),
    };

    for include in &def.includes {
        let policy = store.policy(include).ok_or_else(|| Error::UnknownPolicy {
            policy: include.clone(),
        })?;

        let mut rules = Vec::with_capacity(policy.len());
        for rule in &policy.rules {
            rules.push(compile_rule(store, rule, &mut device.host_groups, warnings)?);
        }
        device.rules.insert(include.clone(), rules);
    }

    Ok(device)
}

fn compile_rule(
    store: &SymbolStore,
    rule: &Rule,
    host_groups: &mut BTreeMap<String, Vec<String>>,
    warnings: &mut Vec<String>,
) -> Result<CompiledRule> {
    let source = compile_endpoint(store, &rule.source.target, host_groups, warnings)?;
    let destination = compile_endpoint(store, &rule.destination.target, host_groups, warnings)?;
    let source_ports = compile_ports(store, &rule.source.port, &rule.protocol, warnings)?;
    let destination_ports = compile_ports(store, &rule.destination.port, &rule.protocol, warnings)?;

    Ok(CompiledRule {
        action: rule.action,
        protocols: expand_protocol(&rule.protocol),
        established: rule.stateful,
        log: rule.log,
        mirror: rule.mirror,
        source,
        source_ports,
        destination,
        destination_ports,
    })
}

fn compile_endpoint(
    store: &SymbolStore,
    target: &Target,
    host_groups: &mut BTreeMap<String, Vec<String>>,
    warnings: &mut Vec<String>,
) -> Result<Endpoint> {
    match target {
        Target::Any => Ok(Endpoint::Any),
        Target::Group(name) => {
            if !host_groups.contains_key(name) {
                let hosts = resolve_hosts(store, name, warnings)?;
                host_groups.insert(name.clone(), hosts);
            }
            Ok(Endpoint::Group(name.clone()))
        }
        Target::Literal(text) => parse_subnet(text).map(Endpoint::Subnet),
    }
}

fn compile_ports(
    store: &SymbolStore,
    spec: &PortSpec,
    protocol: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    match spec {
        PortSpec::Any => Ok(Vec::new()),
        PortSpec::Group(name) => resolve_ports(store, name, protocol, warnings),
        PortSpec::Literal(token) => Ok(vec![lookup_port(token, protocol)?]),
    }
}

pub(crate) fn parse_subnet(text: &str) -> Result<Ipv4Net> {
    let invalid = || Error::InvalidAddress {
        address: text.to_string(),
    };
    let (address, prefix) = match text.split_once('/') {
        Some((address, prefix)) => (address, prefix.parse::<u8>().map_err(|_| invalid())?),
        None => (text, 32),
    };
    let address: Ipv4Addr = address.parse().map_err(|_| invalid())?;
    Ipv4Net::new(address, prefix).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_policy::{parse_hosts, parse_ports, parse_rules};
    use palisade_store::StoreBuilder;

    fn builder_with_objects() -> StoreBuilder {
        let builder = StoreBuilder::new();
        builder.add_host(
            "db-servers",
            parse_hosts("10.1.1.10 10.1.1.11 @db-replicas").unwrap(),
        );
        builder.add_host("db-replicas", parse_hosts("10.2.1.0/24").unwrap());
        builder.add_host("corp", parse_hosts("192.168.0.0/16").unwrap());
        builder.add_port("db-ports", parse_ports("postgresql 6432").unwrap());
        builder
    }

    fn device(includes: &[&str]) -> DeviceDef {
        DeviceDef {
            vendor: "junos".to_string(),
            transport: "ssh".to_string(),
            persist: true,
            timeout: Duration::from_secs(30),
            includes: includes.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn device_compiles_groups_literals_and_ports() {
        let builder = builder_with_objects();
        builder.add_policy(
            "edge",
            parse_rules(
                "allow tcp src @corp dst @db-servers port @db-ports stateful log\n\
                 deny tcpudp src 10.9.0.0/16 dst any\n",
            )
            .unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let compiled = compile_device(&store, &device(&["edge"]), &mut warnings).unwrap();
        assert!(warnings.is_empty());

        assert_eq!(
            compiled.host_groups["db-servers"],
            vec!["10.1.1.10", "10.1.1.11", "10.2.1.0/24"]
        );
        assert_eq!(compiled.host_groups["corp"], vec!["192.168.0.0/16"]);
        assert!(!compiled.host_groups.contains_key("db-replicas"));

        let rules = &compiled.rules["edge"];
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].action, Action::Allow);
        assert_eq!(rules[0].protocols, vec!["tcp"]);
        assert_eq!(rules[0].source, Endpoint::Group("corp".to_string()));
        assert_eq!(rules[0].destination, Endpoint::Group("db-servers".to_string()));
        assert_eq!(rules[0].destination_ports, vec!["5432", "6432"]);
        assert!(rules[0].established);
        assert!(rules[0].log);

        assert_eq!(rules[1].protocols, vec!["tcp", "udp"]);
        assert_eq!(
            rules[1].source,
            Endpoint::Subnet("10.9.0.0/16".parse().unwrap())
        );
        assert_eq!(rules[1].destination, Endpoint::Any);
        assert!(rules[1].destination_ports.is_empty());
    }

    #[test]
    fn bare_addresses_default_to_a_host_prefix() {
        let builder = builder_with_objects();
        builder.add_policy(
            "single",
            parse_rules("allow tcp src any dst 10.1.1.10 port 22").unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let compiled = compile_device(&store, &device(&["single"]), &mut warnings).unwrap();
        let rule = &compiled.rules["single"][0];
        assert_eq!(
            rule.destination,
            Endpoint::Subnet("10.1.1.10/32".parse().unwrap())
        );
    }

    #[test]
    fn one_rule_policy_compiles_field_for_field() {
        let builder = StoreBuilder::new();
        builder.add_host("db-servers", parse_hosts("10.1.1.10 10.1.1.11").unwrap());
        builder.add_policy(
            "db-access",
            parse_rules("allow tcp src any dst @db-servers port 5432 stateful").unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let compiled = compile_device(&store, &device(&["db-access"]), &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            compiled.host_groups["db-servers"],
            vec!["10.1.1.10", "10.1.1.11"]
        );

        let rule = &compiled.rules["db-access"][0];
        assert_eq!(rule.action, Action::Allow);
        assert_eq!(rule.protocols, vec!["tcp"]);
        assert!(rule.established);
        assert!(!rule.log);
        assert!(!rule.mirror);
        assert_eq!(rule.source, Endpoint::Any);
        assert!(rule.source_ports.is_empty());
        assert_eq!(
            rule.destination,
            Endpoint::Group("db-servers".to_string())
        );
        assert_eq!(rule.destination_ports, vec!["5432"]);
    }

    #[test]
    fn unknown_policy_fails_the_device() {
        let store = builder_with_objects().freeze();
        let mut warnings = Vec::new();

        let err = compile_device(&store, &device(&["absent"]), &mut warnings).unwrap_err();
        assert!(matches!(err, Error::UnknownPolicy { policy } if policy == "absent"));
    }

    #[test]
    fn invalid_address_literals_are_rejected() {
        let builder = builder_with_objects();
        builder.add_policy(
            "bad-octet",
            parse_rules("allow tcp src 300.1.1.1 dst any").unwrap(),
        );
        builder.add_policy(
            "bad-word",
            parse_rules("allow tcp src somehost dst any").unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        for include in ["bad-octet", "bad-word"] {
            let err = compile_device(&store, &device(&[include]), &mut warnings).unwrap_err();
            assert!(matches!(err, Error::InvalidAddress { .. }));
        }
    }

    #[test]
    fn host_groups_resolve_once_per_device() {
        let builder = StoreBuilder::new();
        builder.add_host("stale", parse_hosts("@gone 10.0.0.1").unwrap());
        builder.add_policy(
            "first",
            parse_rules("allow tcp src @stale dst any").unwrap(),
        );
        builder.add_policy(
            "second",
            parse_rules("deny udp src @stale dst any").unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let compiled =
            compile_device(&store, &device(&["first", "second"]), &mut warnings).unwrap();
        assert_eq!(compiled.host_groups["stale"], vec!["10.0.0.1"]);
        assert_eq!(warnings, vec!["unknown host object 'gone'"]);
    }

    #[test]
    fn tree_build_isolates_failing_devices() {
        let builder = builder_with_objects();
        builder.add_policy(
            "edge",
            parse_rules("allow tcp src any dst @db-servers port 5432").unwrap(),
        );
        builder.add_device("good.ams", device(&["edge"]));
        builder.add_device("bad.ams", device(&["absent"]));
        let store = builder.freeze();

        let report = build_tree(&store);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].device, "bad.ams");
        assert!(report.tree.devices.contains_key("good.ams"));
        assert!(!report.tree.devices.contains_key("bad.ams"));
    }

    #[test]
    fn reference_cycles_fail_only_the_touching_device() {
        let builder = builder_with_objects();
        builder.add_host("a", parse_hosts("@b").unwrap());
        builder.add_host("b", parse_hosts("@a").unwrap());
        builder.add_policy("looped", parse_rules("allow tcp src @a dst any").unwrap());
        builder.add_policy(
            "clean",
            parse_rules("allow tcp src any dst @corp").unwrap(),
        );
        builder.add_device("cyclic.ams", device(&["looped"]));
        builder.add_device("fine.ams", device(&["clean"]));
        let store = builder.freeze();

        let report = build_tree(&store);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].device, "cyclic.ams");
        assert!(matches!(
            report.failures[0].error,
            Error::CycleDetected { .. }
        ));
        assert!(report.tree.devices.contains_key("fine.ams"));
    }

    #[test]
    fn tree_build_is_deterministic() {
        let builder = builder_with_objects();
        builder.add_policy(
            "edge",
            parse_rules(
                "allow tcp src @corp dst @db-servers port @db-ports\n\
                 deny tcpudp src any dst any log\n",
            )
            .unwrap(),
        );
        for name in ["fw1.ams", "fw2.dus", "fw3.syd"] {
            builder.add_device(name, device(&["edge"]));
        }
        let store = builder.freeze();

        let first = build_tree(&store);
        let second = build_tree(&store);
        assert_eq!(first.tree, second.tree);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(
            first.tree.devices.keys().collect::<Vec<_>>(),
            vec!["fw1.ams", "fw2.dus", "fw3.syd"]
        );
    }

    #[test]
    fn build_warnings_carry_the_device_name() {
        let builder = StoreBuilder::new();
        builder.add_policy(
            "edge",
            parse_rules("allow tcp src @nowhere dst any").unwrap(),
        );
        builder.add_device("fw1.ams", device(&["edge"]));
        let store = builder.freeze();

        let report = build_tree(&store);
        assert!(report.is_clean());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].device, "fw1.ams");
        assert!(report.warnings[0].message.contains("nowhere"));
    }

    #[test]
    fn expired_rules_still_compile() {
        let builder = builder_with_objects();
        builder.add_policy(
            "legacy",
            parse_rules("allow tcp src any dst @corp port 8080 expire 20200101").unwrap(),
        );
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let compiled = compile_device(&store, &device(&["legacy"]), &mut warnings).unwrap();
        assert_eq!(compiled.rules["legacy"].len(), 1);
    }
}
