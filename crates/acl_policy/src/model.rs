//! Typed syntax model for host objects, port objects, and rule sets.
//!
//! These types represent parsed source files. References stay symbolic
//! (the `@` sigil is stripped); resolution happens in a later phase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry in a host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEntry {
    /// Literal address or subnet, as written (`10.0.0.1`, `10.0.0.0/8`).
    Address(String),
    /// Reference to another host object.
    Group(String),
}

/// A parsed host object: an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostObject {
    /// Entries in declaration order.
    pub entries: Vec<HostEntry>,
}

/// One entry in a port object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortEntry {
    /// Literal port, range, or service name (`22`, `1024-2048`, `ssh`).
    Literal(String),
    /// Reference to another port object.
    Group(String),
}

/// A parsed port object: an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortObject {
    /// Entries in declaration order.
    pub entries: Vec<PortEntry>,
}

/// Rule action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Permit matching traffic.
    Allow,
    /// Reject matching traffic.
    Deny,
}

impl Action {
    /// Keyword form, as written in policy files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address side of a rule reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// No address constraint.
    Any,
    /// Reference to a host object.
    Group(String),
    /// Literal address, optionally with `/prefix`.
    Literal(String),
}

/// Port side of a rule reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSpec {
    /// No port constraint.
    Any,
    /// Reference to a port object.
    Group(String),
    /// Literal port, range, or open-ended range.
    Literal(String),
}

/// Source or destination clause of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Address constraint.
    pub target: Target,
    /// Port constraint. Absent port clauses parse as [`PortSpec::Any`].
    pub port: PortSpec,
}

impl Reference {
    /// Creates a reference from its two constraints.
    #[must_use]
    pub const fn new(target: Target, port: PortSpec) -> Self {
        Self { target, port }
    }

    /// Fully unconstrained side (`any`, no port clause).
    #[must_use]
    pub const fn any() -> Self {
        Self {
            target: Target::Any,
            port: PortSpec::Any,
        }
    }
}

/// A single parsed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Allow or deny.
    pub action: Action,
    /// Protocol keyword, possibly a multi-protocol alias such as `tcpudp`.
    pub protocol: String,
    /// Bare `any` qualifier between the protocol and the source clause.
    pub any_qualifier: bool,
    /// Source clause.
    pub source: Reference,
    /// Destination clause.
    pub destination: Reference,
    /// Log matching traffic.
    pub log: bool,
    /// Mirror matching traffic.
    pub mirror: bool,
    /// Date after which the rule should be retired.
    pub expire: Option<NaiveDate>,
    /// Match established connections only.
    pub stateful: bool,
}

impl Rule {
    /// Creates a rule with no options set.
    #[must_use]
    pub fn new(
        action: Action,
        protocol: impl Into<String>,
        source: Reference,
        destination: Reference,
    ) -> Self {
        Self {
            action,
            protocol: protocol.into(),
            any_qualifier: false,
            source,
            destination,
            log: false,
            mirror: false,
            expire: None,
            stateful: false,
        }
    }

    /// Enables the `log` option.
    #[must_use]
    pub fn with_log(mut self) -> Self {
        self.log = true;
        self
    }

    /// Enables the `mirror` option.
    #[must_use]
    pub fn with_mirror(mut self) -> Self {
        self.mirror = true;
        self
    }

    /// Enables the `stateful` option.
    #[must_use]
    pub fn with_stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    /// Sets the expiry date.
    #[must_use]
    pub fn with_expire(mut self, date: NaiveDate) -> Self {
        self.expire = Some(date);
        self
    }
}

/// A parsed policy file: rules in declaration order.
///
/// Order is semantically significant (consumers assume first match wins)
/// and is preserved through compilation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the set has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
