//! Graphviz emitter: the reference structure of one device as a digraph.
//!
//! Edges run device to policy, policy to host group, and group to member
//! address. Edges deduplicate and sort, so the output is stable.

use crate::tree::{CompiledDevice, Endpoint};
use std::collections::BTreeSet;

pub(crate) fn render(name: &str, device: &CompiledDevice) -> String {
    let mut edges = BTreeSet::new();

    for (policy, rules) in &device.rules {
        edges.insert(edge(name, policy));
        for rule in rules {
            for endpoint in [&rule.source, &rule.destination] {
                if let Endpoint::Group(group) = endpoint {
                    edges.insert(edge(policy, group));
                }
            }
        }
    }
    for (group, hosts) in &device.host_groups {
        for host in hosts {
            edges.insert(edge(group, host));
        }
    }

    let mut out = format!("digraph \"{}\" {{\n", name);
    for line in edges {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn edge(from: &str, to: &str) -> String {
    format!("    \"{}\" -> \"{}\";", from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::compile_device;
    use acl_policy::{parse_hosts, parse_rules};
    use palisade_store::{DeviceDef, StoreBuilder};
    use std::time::Duration;

    #[test]
    fn graph_covers_policies_groups_and_members() {
        let builder = StoreBuilder::new();
        builder.add_host("corp", parse_hosts("192.168.0.0/16").unwrap());
        builder.add_host("db-servers", parse_hosts("10.1.1.10 10.2.1.0/24").unwrap());
        builder.add_policy(
            "edge",
            parse_rules(
                "allow tcp src @corp dst @db-servers port 5432\n\
                 deny udp src @corp dst any\n",
            )
            .unwrap(),
        );
        let store = builder.freeze();

        let def = DeviceDef {
            vendor: "junos".to_string(),
            transport: "ssh".to_string(),
            persist: false,
            timeout: Duration::from_secs(30),
            includes: vec!["edge".to_string()],
        };
        let mut warnings = Vec::new();
        let device = compile_device(&store, &def, &mut warnings).unwrap();

        insta::assert_snapshot!(render("fw1.ams", &device), @r#"
        digraph "fw1.ams" {
            "corp" -> "192.168.0.0/16";
            "db-servers" -> "10.1.1.10";
            "db-servers" -> "10.2.1.0/24";
            "edge" -> "corp";
            "edge" -> "db-servers";
            "fw1.ams" -> "edge";
        }
        "#);
    }

    #[test]
    fn repeated_references_emit_one_edge() {
        let builder = StoreBuilder::new();
        builder.add_host("corp", parse_hosts("192.168.0.0/16").unwrap());
        builder.add_policy(
            "twice",
            parse_rules(
                "allow tcp src @corp dst @corp\n\
                 deny udp src @corp dst any\n",
            )
            .unwrap(),
        );
        let store = builder.freeze();

        let def = DeviceDef {
            vendor: "junos".to_string(),
            transport: "ssh".to_string(),
            persist: false,
            timeout: Duration::from_secs(30),
            includes: vec!["twice".to_string()],
        };
        let mut warnings = Vec::new();
        let device = compile_device(&store, &def, &mut warnings).unwrap();
        let output = render("lab1.ams", &device);

        assert_eq!(output.matches("\"twice\" -> \"corp\";").count(), 1);
    }
}
