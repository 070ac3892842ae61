//! Reference resolution, device compilation, and renderers for Palisade.
//!
//! This crate is **pure and deterministic**:
//! - No filesystem or network access
//! - Same store always produces the same tree and the same renders
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade_compiler::{build_tree, render_device};
//!
//! let report = build_tree(&store);
//! for (name, device) in &report.tree.devices {
//!     let config = render_device(name, device)?;
//! }
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod render;
pub mod report;
pub mod resolve;
pub mod services;
pub mod tree;

pub use error::{Error, Result};
pub use render::{export_tree, render_device, render_graph, OutputFormat};
pub use report::{ExpiredRule, LintReport};
pub use resolve::{resolve_hosts, resolve_ports};
pub use services::{expand_protocol, lookup_port, service_port};
pub use tree::{
    build_tree, compile_device, BuildReport, BuildWarning, CompiledDevice, CompiledRule,
    CompiledTree, DeviceFailure, Endpoint,
};
