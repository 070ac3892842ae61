//! Symbol store, device descriptors, and source-tree loading.
//!
//! This crate owns everything between raw source files and the compiler:
//! - The two-phase symbol store (concurrent inserts, then immutable reads)
//! - Device descriptor (`key value`) parsing with structured warnings
//! - The directory loader, one worker thread per source file

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod device;
pub mod error;
pub mod loader;
pub mod store;

pub use device::{parse_device, DeviceDef, LoadWarning};
pub use error::{Error, Result};
pub use loader::{load, SourceConfig};
pub use store::{StoreBuilder, SymbolStore};
