//! Symbol store: parsed objects, policies and devices keyed by name.
//!
//! The store is built in two phases. [`StoreBuilder`] accepts inserts from
//! concurrent loader workers behind per-mapping locks;
//! [`StoreBuilder::freeze`] yields the immutable [`SymbolStore`] that the
//! compilation phase shares across threads without further locking.

use crate::device::DeviceDef;
use acl_policy::{HostObject, PortObject, RuleSet};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Concurrent-insert store populated during the load phase.
///
/// Redefinition under an existing name silently overwrites.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    hosts: RwLock<HashMap<String, HostObject>>,
    ports: RwLock<HashMap<String, PortObject>>,
    policies: RwLock<HashMap<String, RuleSet>>,
    devices: RwLock<HashMap<String, DeviceDef>>,
}

impl StoreBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a host object under `name`.
    pub fn add_host(&self, name: impl Into<String>, hosts: HostObject) {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), hosts);
    }

    /// Inserts a port object under `name`.
    pub fn add_port(&self, name: impl Into<String>, ports: PortObject) {
        self.ports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), ports);
    }

    /// Inserts a policy under `name`.
    pub fn add_policy(&self, name: impl Into<String>, rules: RuleSet) {
        self.policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), rules);
    }

    /// Inserts a device definition under `name`.
    pub fn add_device(&self, name: impl Into<String>, device: DeviceDef) {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), device);
    }

    /// Consumes the builder, yielding the immutable store.
    #[must_use]
    pub fn freeze(self) -> SymbolStore {
        SymbolStore {
            hosts: self.hosts.into_inner().unwrap_or_else(PoisonError::into_inner),
            ports: self.ports.into_inner().unwrap_or_else(PoisonError::into_inner),
            policies: self
                .policies
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
            devices: self
                .devices
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Immutable symbol store read by the compilation phase.
///
/// Every name a rule or device references must be present here by the time
/// resolution starts; lookups never mutate.
#[derive(Debug, Default)]
pub struct SymbolStore {
    hosts: HashMap<String, HostObject>,
    ports: HashMap<String, PortObject>,
    policies: HashMap<String, RuleSet>,
    devices: HashMap<String, DeviceDef>,
}

impl SymbolStore {
    /// Looks up a host object by name.
    #[must_use]
    pub fn host(&self, name: &str) -> Option<&HostObject> {
        self.hosts.get(name)
    }

    /// Looks up a port object by name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&PortObject> {
        self.ports.get(name)
    }

    /// Looks up a policy by name.
    #[must_use]
    pub fn policy(&self, name: &str) -> Option<&RuleSet> {
        self.policies.get(name)
    }

    /// Looks up a device definition by name.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceDef> {
        self.devices.get(name)
    }

    /// All host objects.
    #[must_use]
    pub fn hosts(&self) -> &HashMap<String, HostObject> {
        &self.hosts
    }

    /// All port objects.
    #[must_use]
    pub fn ports(&self) -> &HashMap<String, PortObject> {
        &self.ports
    }

    /// All policies.
    #[must_use]
    pub fn policies(&self) -> &HashMap<String, RuleSet> {
        &self.policies
    }

    /// All device definitions.
    #[must_use]
    pub fn devices(&self) -> &HashMap<String, DeviceDef> {
        &self.devices
    }
}
