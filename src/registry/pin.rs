//! One registered pin: the binding between a consumer and a physical index.

use core::fmt;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::app::ports::PinLink;
use crate::pins::{PinIndex, PinValue, Timestamp};
use crate::status::{PinPatch, Registration};

/// Value change delivered to a pin owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinUpdate {
    pub index: PinIndex,
    pub value: PinValue,
    pub at: Timestamp,
    /// Reading replayed to a new owner at registration time.
    #[serde(default)]
    pub registering: bool,
}

/// Flavour-specific send behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// Forward every level to the owner as-is.
    Relay,
    /// Count rising edges and forward the running count.
    Counter {
        count: PinValue,
        level: Option<PinValue>,
    },
}

pub struct Pin {
    index: PinIndex,
    type_key: String,
    flavour: String,
    caps: BTreeSet<String>,
    /// Registration metadata; flavour and type setup hooks fill it in.
    pub registered: Registration,
    pub send_mode: SendMode,
    link: Box<dyn PinLink>,
    value: Option<PinValue>,
    at: Option<Timestamp>,
}

impl Pin {
    pub(crate) fn new(
        index: PinIndex,
        type_key: &str,
        flavour: &str,
        caps: BTreeSet<String>,
        registered: Registration,
        link: Box<dyn PinLink>,
    ) -> Self {
        Self {
            index,
            type_key: type_key.to_owned(),
            flavour: flavour.to_owned(),
            caps,
            registered,
            send_mode: SendMode::Relay,
            link,
            value: None,
            at: None,
        }
    }

    pub fn index(&self) -> PinIndex {
        self.index
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn flavour(&self) -> &str {
        &self.flavour
    }

    pub fn caps(&self) -> &BTreeSet<String> {
        &self.caps
    }

    /// Last raw value seen by this pin.
    pub fn value(&self) -> Option<PinValue> {
        self.value
    }

    pub fn at(&self) -> Option<Timestamp> {
        self.at
    }

    /// Deliver a raw value change to the owner.
    ///
    /// Returns the patch to mirror into the status tree; the tree always
    /// records the raw reading, whatever the owner receives.
    pub fn send(&mut self, value: PinValue, at: Timestamp) -> PinPatch {
        self.value = Some(value);
        self.at = Some(at);

        let delivered = match &mut self.send_mode {
            SendMode::Relay => value,
            SendMode::Counter { count, level } => {
                let rising = value != 0 && level.is_none_or(|l| l == 0);
                if rising {
                    *count = count.wrapping_add(1);
                }
                *level = Some(value);
                *count
            }
        };

        self.link.update(&PinUpdate {
            index: self.index,
            value: delivered,
            at,
            registering: false,
        });

        PinPatch::reading(value, at)
    }

    pub(crate) fn link_mut(&mut self) -> &mut dyn PinLink {
        self.link.as_mut()
    }

    /// Replay a reading inherited from the status tree to the new owner.
    pub(crate) fn echo(&mut self, value: PinValue, at: Timestamp) {
        self.value = Some(value);
        self.at = Some(at);
        self.link.update(&PinUpdate {
            index: self.index,
            value,
            at,
            registering: true,
        });
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("index", &self.index)
            .field("type_key", &self.type_key)
            .field("flavour", &self.flavour)
            .field("send_mode", &self.send_mode)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
