//! Recursive expansion of host and port objects.
//!
//! Expansion is depth-first and preserves declaration order. A reference
//! to an object the store does not hold is not fatal: it logs a warning
//! and contributes nothing, so one stale name cannot take down a whole
//! device build. Cycles and runaway nesting are fatal.

use crate::error::{Error, Result};
use crate::services::lookup_port;
use acl_policy::{HostEntry, PortEntry};
use palisade_store::SymbolStore;
use tracing::warn;

const MAX_DEPTH: usize = 64;

/// Flattens a host object into its address literals, in declaration order.
///
/// Nested group references expand in place. Unknown objects resolve to
/// nothing and record a message in `warnings`.
///
/// # Errors
///
/// Returns an error when expansion re-enters an object or nests past the
/// depth bound.
pub fn resolve_hosts(
    store: &SymbolStore,
    name: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut stack = Vec::new();
    hosts_inner(store, name, &mut stack, warnings)
}

fn hosts_inner(
    store: &SymbolStore,
    name: &str,
    stack: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    guard(name, stack)?;

    let Some(object) = store.host(name) else {
        warn!("failed to find host object: {}", name);
        warnings.push(format!("unknown host object '{}'", name));
        return Ok(Vec::new());
    };

    stack.push(name.to_string());
    let mut result = Vec::new();
    for entry in &object.entries {
        match entry {
            HostEntry::Address(address) => result.push(address.clone()),
            HostEntry::Group(group) => {
                result.extend(hosts_inner(store, group, stack, warnings)?);
            }
        }
    }
    stack.pop();

    Ok(result)
}

/// Flattens a port object into numeric port tokens, in declaration order.
///
/// Literal entries resolve through [`lookup_port`] under `protocol`;
/// nested group references expand in place. Unknown objects resolve to
/// nothing and record a message in `warnings`.
///
/// # Errors
///
/// Returns an error when a literal fails to resolve, when expansion
/// re-enters an object, or when nesting passes the depth bound.
pub fn resolve_ports(
    store: &SymbolStore,
    name: &str,
    protocol: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut stack = Vec::new();
    ports_inner(store, name, protocol, &mut stack, warnings)
}

fn ports_inner(
    store: &SymbolStore,
    name: &str,
    protocol: &str,
    stack: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>> {
    guard(name, stack)?;

    let Some(object) = store.port(name) else {
        warn!("failed to find port object: {}", name);
        warnings.push(format!("unknown port object '{}'", name));
        return Ok(Vec::new());
    };

    stack.push(name.to_string());
    let mut result = Vec::new();
    for entry in &object.entries {
        match entry {
            PortEntry::Literal(token) => result.push(lookup_port(token, protocol)?),
            PortEntry::Group(group) => {
                result.extend(ports_inner(store, group, protocol, stack, warnings)?);
            }
        }
    }
    stack.pop();

    Ok(result)
}

fn guard(name: &str, stack: &[String]) -> Result<()> {
    if stack.iter().any(|seen| seen == name) {
        return Err(Error::CycleDetected {
            object: name.to_string(),
        });
    }
    if stack.len() >= MAX_DEPTH {
        return Err(Error::DepthExceeded {
            object: name.to_string(),
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_policy::{parse_hosts, parse_ports};
    use palisade_store::StoreBuilder;

    fn store(hosts: &[(&str, &str)], ports: &[(&str, &str)]) -> SymbolStore {
        let builder = StoreBuilder::new();
        for (name, body) in hosts {
            builder.add_host(*name, parse_hosts(body).unwrap());
        }
        for (name, body) in ports {
            builder.add_port(*name, parse_ports(body).unwrap());
        }
        builder.freeze()
    }

    #[test]
    fn flat_object_resolves_in_declaration_order() {
        let store = store(&[("web", "10.0.0.2 10.0.0.1 192.168.0.0/24")], &[]);
        let mut warnings = Vec::new();

        let hosts = resolve_hosts(&store, "web", &mut warnings).unwrap();
        assert_eq!(hosts, vec!["10.0.0.2", "10.0.0.1", "192.168.0.0/24"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn nested_groups_flatten_depth_first() {
        let store = store(
            &[
                ("all", "@ams @dus 172.16.0.1"),
                ("ams", "10.1.0.1 10.1.0.2"),
                ("dus", "10.2.0.1"),
            ],
            &[],
        );
        let mut warnings = Vec::new();

        let hosts = resolve_hosts(&store, "all", &mut warnings).unwrap();
        assert_eq!(
            hosts,
            vec!["10.1.0.1", "10.1.0.2", "10.2.0.1", "172.16.0.1"]
        );
    }

    #[test]
    fn unknown_objects_resolve_empty_with_a_warning() {
        let store = store(&[("edge", "@missing 10.0.0.1")], &[]);
        let mut warnings = Vec::new();

        let hosts = resolve_hosts(&store, "edge", &mut warnings).unwrap();
        assert_eq!(hosts, vec!["10.0.0.1"]);
        assert_eq!(warnings, vec!["unknown host object 'missing'"]);

        let ports = resolve_ports(&store, "absent", "tcp", &mut warnings).unwrap();
        assert!(ports.is_empty());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let store = store(&[("loop", "@loop")], &[]);
        let mut warnings = Vec::new();

        let err = resolve_hosts(&store, "loop", &mut warnings).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { object } if object == "loop"));
    }

    #[test]
    fn mutual_references_are_a_cycle() {
        let store = store(&[("a", "10.0.0.1 @b"), ("b", "@a")], &[]);
        let mut warnings = Vec::new();

        let err = resolve_hosts(&store, "a", &mut warnings).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[test]
    fn shared_subgroups_are_not_cycles() {
        let store = store(
            &[
                ("top", "@left @right"),
                ("left", "@base"),
                ("right", "@base"),
                ("base", "10.0.0.1"),
            ],
            &[],
        );
        let mut warnings = Vec::new();

        let hosts = resolve_hosts(&store, "top", &mut warnings).unwrap();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.1"]);
    }

    #[test]
    fn nesting_past_the_bound_is_rejected() {
        let builder = StoreBuilder::new();
        for level in 0..70 {
            let body = format!("@level{}", level + 1);
            builder.add_host(format!("level{level}"), parse_hosts(&body).unwrap());
        }
        builder.add_host("level70", parse_hosts("10.0.0.1").unwrap());
        let store = builder.freeze();
        let mut warnings = Vec::new();

        let err = resolve_hosts(&store, "level0", &mut warnings).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 64, .. }));
    }

    #[test]
    fn port_groups_resolve_to_numbers() {
        let store = store(
            &[],
            &[
                ("web", "http https @extra"),
                ("extra", "8080-8089 webcache"),
            ],
        );
        let mut warnings = Vec::new();

        let ports = resolve_ports(&store, "web", "tcp", &mut warnings).unwrap();
        assert_eq!(ports, vec!["80", "443", "8080-8089", "8080"]);
    }

    #[test]
    fn port_resolution_respects_the_protocol() {
        let store = store(&[], &[("logging", "syslog")]);
        let mut warnings = Vec::new();

        let ports = resolve_ports(&store, "logging", "udp", &mut warnings).unwrap();
        assert_eq!(ports, vec!["514"]);

        let err = resolve_ports(&store, "logging", "tcp", &mut warnings).unwrap_err();
        assert!(matches!(err, Error::UnknownService { .. }));
    }
}
