//! Pin type descriptors and the capability table.
//!
//! A type descriptor is a row of plain function pointers, the same shape as
//! a state table row: optional `setup` run after the flavour's setup, and
//! optional `read` used by [`PinRegistry::read_all`](super::PinRegistry::read_all)
//! for polling-style types.

use std::collections::{BTreeMap, BTreeSet};

use crate::app::ports::MasterLink;
use crate::config::{DIGITAL_TYPE, DIN_TYPE, PinTypeConfig};
use crate::pins::{PinIndex, PinMode};
use crate::status::PinStatus;

use super::pin::Pin;
use super::{RegisterRequest, RegisterResponse};

/// Static capability descriptor: supported type keys per physical pin.
pub type Capabilities = BTreeMap<PinIndex, BTreeSet<String>>;

/// Hook run at registration after the flavour setup.
pub type PinSetupFn = fn(&mut Pin, &RegisterRequest, &mut PinStatus, &mut RegisterResponse);

/// Hook asking the master for a fresh reading of a registered pin.
pub type PinReadFn = fn(&Pin, &mut dyn MasterLink);

/// One row of the type table.
#[derive(Debug, Clone)]
pub struct PinTypeDescriptor {
    pub key: String,
    pub name: String,
    pub setup: Option<PinSetupFn>,
    pub read: Option<PinReadFn>,
}

impl PinTypeDescriptor {
    /// Descriptor without hooks.  `name` defaults to `key`.
    pub fn new(key: &str, name: Option<&str>) -> Self {
        Self {
            key: key.to_owned(),
            name: name.unwrap_or(key).to_owned(),
            setup: None,
            read: None,
        }
    }

    /// Descriptor with the hooks of a built-in type attached, if `key` names one.
    pub fn builtin(key: &str, name: Option<&str>) -> Self {
        let mut d = Self::new(key, name);
        match key {
            DIGITAL_TYPE => d.setup = Some(digital_setup),
            DIN_TYPE => d.read = Some(din_read),
            _ => {}
        }
        d
    }
}

/// Type key → descriptor.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: BTreeMap<String, PinTypeDescriptor>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BTreeMap<String, PinTypeConfig>) -> Self {
        let mut table = Self::new();
        for (key, ty) in config {
            table.insert(PinTypeDescriptor::builtin(key, ty.name.as_deref()));
        }
        table
    }

    pub fn insert(&mut self, descriptor: PinTypeDescriptor) {
        self.types.insert(descriptor.key.clone(), descriptor);
    }

    pub fn get(&self, key: &str) -> Option<&PinTypeDescriptor> {
        self.types.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinTypeDescriptor> {
        self.types.values()
    }
}

// ── Built-in hooks ────────────────────────────────────────────

/// Digital pins default to inputs unless the consumer asked for an output.
fn digital_setup(
    pin: &mut Pin,
    _request: &RegisterRequest,
    state: &mut PinStatus,
    _response: &mut RegisterResponse,
) {
    if pin.registered.mode.is_none() {
        pin.registered.mode = Some(PinMode::In);
    }
    if let Some(reg) = state.registered.as_mut() {
        reg.mode = pin.registered.mode;
    }
}

fn din_read(pin: &Pin, master: &mut dyn MasterLink) {
    master.read(pin.index());
}
