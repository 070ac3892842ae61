//! IOS emitter: network object-groups plus one extended access list per
//! policy.
//!
//! An access list entry holds exactly one protocol and one port clause
//! per side, so rules expand into one entry per protocol and port
//! combination. `established` only applies to tcp entries, and per-entry
//! mirroring has no syntax here at all, so it is not emitted.

use crate::error::Result;
use crate::tree::{parse_subnet, CompiledDevice, CompiledRule, Endpoint};
use acl_policy::Action;

pub(crate) fn render(name: &str, device: &CompiledDevice) -> Result<String> {
    let mut out = format!("! {}\n", name);

    for (group, hosts) in &device.host_groups {
        out.push_str(&format!("object-group network {}\n", group));
        for host in hosts {
            let net = parse_subnet(host)?;
            if net.prefix_len() == 32 {
                out.push_str(&format!(" host {}\n", net.addr()));
            } else {
                out.push_str(&format!(" {} {}\n", net.network(), net.netmask()));
            }
        }
    }

    for (policy, rules) in &device.rules {
        out.push_str(&format!("ip access-list extended {}\n", policy));
        for rule in rules {
            push_entries(&mut out, rule);
        }
    }

    Ok(out)
}

fn push_entries(out: &mut String, rule: &CompiledRule) {
    let action = match rule.action {
        Action::Allow => "permit",
        Action::Deny => "deny",
    };
    let source = address(&rule.source);
    let destination = address(&rule.destination);
    let source_ports = port_clauses(&rule.source_ports);
    let destination_ports = port_clauses(&rule.destination_ports);

    for protocol in &rule.protocols {
        for sport in &source_ports {
            for dport in &destination_ports {
                out.push_str(&format!(
                    " {} {} {}{} {}{}",
                    action, protocol, source, sport, destination, dport
                ));
                if rule.established && protocol == "tcp" {
                    out.push_str(" established");
                }
                if rule.log {
                    out.push_str(" log");
                }
                out.push('\n');
            }
        }
    }
}

fn address(endpoint: &Endpoint) -> String {
    match endpoint {
        Endpoint::Any => "any".to_string(),
        Endpoint::Group(group) => format!("object-group {}", group),
        Endpoint::Subnet(net) if net.prefix_len() == 32 => format!("host {}", net.addr()),
        Endpoint::Subnet(net) => format!("{} {}", net.network(), net.hostmask()),
    }
}

/// Port clauses to expand over; an empty list means one unconstrained
/// entry, not zero entries.
fn port_clauses(ports: &[String]) -> Vec<String> {
    if ports.is_empty() {
        return vec![String::new()];
    }
    ports
        .iter()
        .map(|token| match token.split_once('-') {
            Some((low, high)) => format!(" range {} {}", low, high),
            None => format!(" eq {}", token),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tree::compile_device;
    use acl_policy::{parse_hosts, parse_ports, parse_rules};
    use palisade_store::{DeviceDef, StoreBuilder};
    use std::time::Duration;

    fn compiled(hosts: &[(&str, &str)], policy: &str) -> CompiledDevice {
        let builder = StoreBuilder::new();
        for (name, body) in hosts {
            builder.add_host(*name, parse_hosts(body).unwrap());
        }
        builder.add_port("db-ports", parse_ports("postgresql 6432").unwrap());
        builder.add_policy("edge", parse_rules(policy).unwrap());
        let store = builder.freeze();

        let def = DeviceDef {
            vendor: "ios".to_string(),
            transport: "ssh".to_string(),
            persist: false,
            timeout: Duration::from_secs(30),
            includes: vec!["edge".to_string()],
        };
        let mut warnings = Vec::new();
        compile_device(&store, &def, &mut warnings).unwrap()
    }

    #[test]
    fn renders_object_groups_and_expanded_entries() {
        let device = compiled(
            &[
                ("corp", "192.168.0.0/16"),
                ("db-servers", "10.1.1.10 10.2.1.0/24"),
            ],
            "allow tcp src @corp dst @db-servers port @db-ports stateful log\n\
             deny tcpudp src 10.9.0.0/16 dst any\n",
        );

        insta::assert_snapshot!(render("fw2.ams", &device).unwrap(), @r"
        ! fw2.ams
        object-group network corp
         192.168.0.0 255.255.0.0
        object-group network db-servers
         host 10.1.1.10
         10.2.1.0 255.255.255.0
        ip access-list extended edge
         permit tcp object-group corp object-group db-servers eq 5432 established log
         permit tcp object-group corp object-group db-servers eq 6432 established log
         deny tcp 10.9.0.0 0.0.255.255 any
         deny udp 10.9.0.0 0.0.255.255 any
        ");
    }

    #[test]
    fn source_and_destination_ports_cross_multiply() {
        let device = compiled(
            &[],
            "allow tcp src any port 1024-2048 dst 10.0.0.1 port 80",
        );

        insta::assert_snapshot!(render("fw3.ams", &device).unwrap(), @r"
        ! fw3.ams
        ip access-list extended edge
         permit tcp any range 1024 2048 host 10.0.0.1 eq 80
        ");
    }

    #[test]
    fn established_is_dropped_from_udp_entries() {
        let device = compiled(&[], "allow tcpudp src any dst any stateful");

        insta::assert_snapshot!(render("fw4.ams", &device).unwrap(), @r"
        ! fw4.ams
        ip access-list extended edge
         permit tcp any any established
         permit udp any any
        ");
    }

    #[test]
    fn unparseable_group_members_fail_the_render() {
        let device = compiled(
            &[("broken", "999.0.0.1")],
            "allow tcp src @broken dst any",
        );

        let err = render("fw5.ams", &device).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { address } if address == "999.0.0.1"));
    }
}
