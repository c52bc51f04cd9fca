//! Mirrored status tree for one master.
//!
//! Holds `pins[index]` and `pinTypes[key]`.  The tree is owned by the
//! [`PinRegistry`](crate::registry::PinRegistry); nothing else writes to it.
//! Every write is a per-index [`PinPatch`] merged key by key, so updates to
//! one pin never clobber another pin's entry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::pins::{PinIndex, PinMode, PinValue, Timestamp};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Who registered a pin and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PinMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<PinIndex>,
    pub at: Timestamp,
}

/// Mirrored descriptor of one physical pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinStatus {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<Registration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PinValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<Timestamp>,
}

impl PinStatus {
    /// Overlay every key present in `residual` onto `self`.
    pub fn absorb(&mut self, residual: &PinStatus) {
        let patch = PinPatch::from_status(residual);
        patch.apply_to(self);
    }

    /// True when no transient (registration) key is set.
    pub fn is_unregistered(&self) -> bool {
        self.type_key.is_none()
            && self.flavour.is_none()
            && self.registered.is_none()
            && self.caps.is_none()
    }
}

/// Display information of a pin type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinTypeStatus {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Tri-state field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> Patch<T> {
    fn apply(self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(v) => *slot = Some(v),
            Self::Clear => *slot = None,
        }
    }

    fn from_option(v: Option<T>) -> Self {
        v.map_or(Self::Keep, Self::Set)
    }

    fn clear_if<U>(present: &Option<U>) -> Self {
        if present.is_some() { Self::Clear } else { Self::Keep }
    }
}

/// Set of key updates for one `pins[index]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinPatch {
    pub type_key: Patch<String>,
    pub flavour: Patch<String>,
    pub registered: Patch<Registration>,
    pub caps: Patch<BTreeSet<String>>,
    pub value: Patch<PinValue>,
    pub at: Patch<Timestamp>,
}

impl PinPatch {
    /// `{value, at}` — a raw reading.
    pub fn reading(value: PinValue, at: Timestamp) -> Self {
        Self {
            value: Patch::Set(value),
            at: Patch::Set(at),
            ..Self::default()
        }
    }

    /// Set every key present in `status`.
    pub fn from_status(status: &PinStatus) -> Self {
        Self {
            type_key: Patch::from_option(status.type_key.clone()),
            flavour: Patch::from_option(status.flavour.clone()),
            registered: Patch::from_option(status.registered.clone()),
            caps: Patch::from_option(status.caps.clone()),
            value: Patch::from_option(status.value),
            at: Patch::from_option(status.at),
        }
    }

    /// Clear every key of `current` except `value` and `at`.
    pub fn clear_transient(current: &PinStatus) -> Self {
        Self {
            type_key: Patch::clear_if(&current.type_key),
            flavour: Patch::clear_if(&current.flavour),
            registered: Patch::clear_if(&current.registered),
            caps: Patch::clear_if(&current.caps),
            value: Patch::Keep,
            at: Patch::Keep,
        }
    }

    fn apply_to(self, status: &mut PinStatus) {
        self.type_key.apply(&mut status.type_key);
        self.flavour.apply(&mut status.flavour);
        self.registered.apply(&mut status.registered);
        self.caps.apply(&mut status.caps);
        self.value.apply(&mut status.value);
        self.at.apply(&mut status.at);
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTree {
    pins: BTreeMap<PinIndex, PinStatus>,
    #[serde(rename = "pinTypes")]
    pin_types: BTreeMap<String, PinTypeStatus>,
}

impl StatusTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `patch` into `pins[index]`, creating the entry if needed.
    pub fn apply_patch(&mut self, index: PinIndex, patch: PinPatch) {
        let entry = self.pins.entry(index).or_default();
        patch.apply_to(entry);
    }

    pub fn pin(&self, index: PinIndex) -> Option<&PinStatus> {
        self.pins.get(&index)
    }

    pub fn pins(&self) -> &BTreeMap<PinIndex, PinStatus> {
        &self.pins
    }

    pub fn set_pin_type(&mut self, key: &str, name: &str) {
        self.pin_types.insert(
            key.to_owned(),
            PinTypeStatus {
                name: name.to_owned(),
            },
        );
    }

    pub fn pin_types(&self) -> &BTreeMap<String, PinTypeStatus> {
        &self.pin_types
    }
}
