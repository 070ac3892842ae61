//! ACL policy language: lexer, parsers and typed syntax model.
//!
//! This crate provides:
//! - A shared lexer for the three source file sub-languages
//! - Parsers for host objects, port objects and rule policies
//! - A typed model that keeps references symbolic for later resolution
//!
//! # Example
//!
//! ```rust,ignore
//! use acl_policy::{parse_rules, Action};
//!
//! let set = parse_rules("allow tcp src any dst @db-servers port 5432")?;
//! assert_eq!(set.rules[0].action, Action::Allow);
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;

pub use error::{Error, Result};
pub use lexer::{lex, Token, TokenKind};
pub use model::{
    Action, HostEntry, HostObject, PortEntry, PortObject, PortSpec, Reference, Rule, RuleSet,
    Target,
};
pub use parser::{parse_hosts, parse_ports, parse_rules};
