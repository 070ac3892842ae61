//! Junos emitter: policy-options prefix-lists plus one inet firewall
//! filter per policy, one term per rule.
//!
//! Group members render textually; a bare address gets a `/32` suffix.

use crate::tree::{CompiledDevice, CompiledRule, Endpoint};
use acl_policy::Action;

const I1: &str = "    ";
const I2: &str = "        ";
const I3: &str = "            ";
const I4: &str = "                ";
const I5: &str = "                    ";
const I6: &str = "                        ";

pub(crate) fn render(name: &str, device: &CompiledDevice) -> String {
    let mut out = format!("/* {} */\n", name);

    if !device.host_groups.is_empty() {
        out.push_str("policy-options {\n");
        for (group, hosts) in &device.host_groups {
            out.push_str(&format!("{}prefix-list {} {{\n", I1, group));
            for host in hosts {
                out.push_str(&format!("{}{};\n", I2, prefix(host)));
            }
            out.push_str(&format!("{}}}\n", I1));
        }
        out.push_str("}\n");
    }

    out.push_str("firewall {\n");
    out.push_str(&format!("{}family inet {{\n", I1));
    for (policy, rules) in &device.rules {
        out.push_str(&format!("{}filter {} {{\n", I2, policy));
        for (index, rule) in rules.iter().enumerate() {
            push_term(&mut out, policy, index + 1, rule);
        }
        out.push_str(&format!("{}}}\n", I2));
    }
    out.push_str(&format!("{}}}\n", I1));
    out.push_str("}\n");

    out
}

fn push_term(out: &mut String, policy: &str, index: usize, rule: &CompiledRule) {
    out.push_str(&format!("{}term {}-{} {{\n", I3, policy, index));

    out.push_str(&format!("{}from {{\n", I4));
    push_endpoint(out, "source", &rule.source);
    push_endpoint(out, "destination", &rule.destination);
    out.push_str(&format!("{}protocol {};\n", I5, bracketed(&rule.protocols)));
    if !rule.source_ports.is_empty() {
        out.push_str(&format!("{}source-port {};\n", I5, bracketed(&rule.source_ports)));
    }
    if !rule.destination_ports.is_empty() {
        out.push_str(&format!(
            "{}destination-port {};\n",
            I5,
            bracketed(&rule.destination_ports)
        ));
    }
    if rule.established {
        out.push_str(&format!("{}tcp-established;\n", I5));
    }
    out.push_str(&format!("{}}}\n", I4));

    out.push_str(&format!("{}then {{\n", I4));
    if rule.log {
        out.push_str(&format!("{}log;\n", I5));
    }
    if rule.mirror {
        out.push_str(&format!("{}port-mirror;\n", I5));
    }
    let action = match rule.action {
        Action::Allow => "accept",
        Action::Deny => "discard",
    };
    out.push_str(&format!("{}{};\n", I5, action));
    out.push_str(&format!("{}}}\n", I4));

    out.push_str(&format!("{}}}\n", I3));
}

fn push_endpoint(out: &mut String, side: &str, endpoint: &Endpoint) {
    match endpoint {
        Endpoint::Any => {}
        Endpoint::Subnet(net) => {
            out.push_str(&format!("{}{}-address {{\n", I5, side));
            out.push_str(&format!("{}{};\n", I6, net));
            out.push_str(&format!("{}}}\n", I5));
        }
        Endpoint::Group(group) => {
            out.push_str(&format!("{}{}-prefix-list {{\n", I5, side));
            out.push_str(&format!("{}{};\n", I6, group));
            out.push_str(&format!("{}}}\n", I5));
        }
    }
}

fn bracketed(items: &[String]) -> String {
    if items.len() == 1 {
        items[0].clone()
    } else {
        format!("[ {} ]", items.join(" "))
    }
}

fn prefix(host: &str) -> String {
    if host.contains('/') {
        host.to_string()
    } else {
        format!("{}/32", host)
    }
}
