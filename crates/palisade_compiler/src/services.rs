//! Service name tables and port token resolution.
//!
//! Lookups go through a fixed in-process table rather than the system
//! services database, so results do not depend on the host `/etc/services`.
//! Numeric tokens bypass the table entirely.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static TCP_SERVICES: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    HashMap::from([
        ("ftp", 21),
        ("ssh", 22),
        ("telnet", 23),
        ("smtp", 25),
        ("domain", 53),
        ("http", 80),
        ("kerberos", 88),
        ("pop3", 110),
        ("sunrpc", 111),
        ("auth", 113),
        ("imap", 143),
        ("bgp", 179),
        ("ldap", 389),
        ("https", 443),
        ("submission", 587),
        ("ldaps", 636),
        ("rsync", 873),
        ("imaps", 993),
        ("pop3s", 995),
        ("openvpn", 1194),
        ("mysql", 3306),
        ("postgresql", 5432),
        ("redis", 6379),
        ("webcache", 8080),
    ])
});

static UDP_SERVICES: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    HashMap::from([
        ("domain", 53),
        ("bootps", 67),
        ("bootpc", 68),
        ("tftp", 69),
        ("sunrpc", 111),
        ("ntp", 123),
        ("snmp", 161),
        ("snmptrap", 162),
        ("isakmp", 500),
        ("syslog", 514),
        ("openvpn", 1194),
        ("radius", 1812),
    ])
});

/// Looks up the number assigned to a named service under `protocol`.
///
/// Only `tcp` and `udp` have tables; any other protocol resolves nothing.
pub fn service_port(service: &str, protocol: &str) -> Option<u16> {
    let table = match protocol {
        "tcp" => &TCP_SERVICES,
        "udp" => &UDP_SERVICES,
        _ => return None,
    };
    table.get(service).copied()
}

/// Expands a protocol keyword to the concrete protocols it covers.
///
/// `tcpudp` is the one alias; everything else passes through unchanged.
pub fn expand_protocol(protocol: &str) -> Vec<String> {
    if protocol == "tcpudp" {
        return vec!["tcp".to_string(), "udp".to_string()];
    }
    vec![protocol.to_string()]
}

/// Resolves one port token to its numeric form.
///
/// A token is a single port or a range split at its first hyphen. A
/// leading hyphen means "from 1", a trailing hyphen means "to 65535".
/// Each half resolves independently: digits parse as a number in
/// `1..=65535`, anything else consults the service table for `protocol`.
///
/// # Errors
///
/// Returns [`Error::InvalidPort`] for numbers out of range and
/// [`Error::UnknownService`] for names the table does not carry.
pub fn lookup_port(token: &str, protocol: &str) -> Result<String> {
    let parts: Vec<&str> = match token.find('-') {
        None => vec![token],
        Some(0) => vec!["1", &token[1..]],
        Some(i) if i == token.len() - 1 => vec![&token[..i], "65535"],
        Some(i) => vec![&token[..i], &token[i + 1..]],
    };

    let mut resolved = Vec::with_capacity(parts.len());
    for part in parts {
        resolved.push(resolve_part(part, protocol, token)?);
    }
    Ok(resolved.join("-"))
}

fn resolve_part(part: &str, protocol: &str, token: &str) -> Result<String> {
    if part.chars().all(|c| c.is_ascii_digit()) {
        let number: u32 = part.parse().map_err(|_| Error::InvalidPort {
            port: token.to_string(),
        })?;
        if !(1..=65535).contains(&number) {
            return Err(Error::InvalidPort {
                port: token.to_string(),
            });
        }
        return Ok(number.to_string());
    }

    service_port(part, protocol)
        .map(|number| number.to_string())
        .ok_or_else(|| Error::UnknownService {
            service: part.to_string(),
            protocol: protocol.to_string(),
        })
}
