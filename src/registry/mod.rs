//! Pin registry — ownership and state of every physical pin of one master.
//!
//! The registry validates registrations against the type table and the
//! static capability table, binds each accepted index to exactly one
//! [`Pin`], and is the only writer of the mirrored [`StatusTree`].
//!
//! ```text
//!   register ──▶ validate ──▶ Pin::new ──▶ flavour.setup ──▶ type.setup
//!                                             │
//!        residual {value, at} ──▶ merge ──▶ pins[index] ──▶ link.open
//!
//!   update ──▶ bound?  ──▶ Pin::send ──▶ owner + pins[index]
//!          └─▶ known?  ──▶ pins[index] = {value, at}
//!          └─▶ unknown ──▶ logged, dropped
//! ```

pub mod flavour;
pub mod pin;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, MasterLink, PinLink};
use crate::config::ControlConfig;
use crate::error::RegistryError;
use crate::pins::{PinCommand, PinIndex, PinMode, PinValue};
use crate::status::{PinPatch, PinStatus, Registration, StatusTree};

use self::flavour::{Flavour, FlavourTable};
use self::pin::{Pin, SendMode};
use self::types::{Capabilities, TypeTable};

// ───────────────────────────────────────────────────────────────
// Wire types
// ───────────────────────────────────────────────────────────────

/// Registration request sent by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub index: PinIndex,
    #[serde(rename = "type")]
    pub type_key: String,
    /// Behaviour name; defaults to the type key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PinMode>,
    /// Pin that must never be engaged together with this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<PinIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl RegisterRequest {
    pub fn new(index: PinIndex, type_key: &str) -> Self {
        Self {
            index,
            type_key: type_key.to_owned(),
            flavour: None,
            mode: None,
            conflict: None,
            caption: None,
            owner: None,
        }
    }

    pub fn with_flavour(mut self, flavour: &str) -> Self {
        self.flavour = Some(flavour.to_owned());
        self
    }

    pub fn with_mode(mut self, mode: PinMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_conflict(mut self, conflict: PinIndex) -> Self {
        self.conflict = Some(conflict);
        self
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.to_owned());
        self
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_owned());
        self
    }

    pub fn flavour_name(&self) -> &str {
        self.flavour.as_deref().unwrap_or(&self.type_key)
    }
}

/// Payload delivered through [`PinLink::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub index: PinIndex,
    pub caps: BTreeSet<String>,
}

// ───────────────────────────────────────────────────────────────
// PinRegistry
// ───────────────────────────────────────────────────────────────

pub struct PinRegistry {
    types: TypeTable,
    caps: Capabilities,
    flavours: FlavourTable,
    pins: BTreeMap<PinIndex, Pin>,
    status: StatusTree,
}

impl PinRegistry {
    /// Registry with the built-in flavours.
    pub fn new(types: TypeTable, caps: Capabilities) -> Self {
        Self::with_flavours(types, caps, FlavourTable::builtin())
    }

    pub fn with_flavours(types: TypeTable, caps: Capabilities, flavours: FlavourTable) -> Self {
        let mut status = StatusTree::new();
        for ty in types.iter() {
            status.set_pin_type(&ty.key, &ty.name);
        }
        Self {
            types,
            caps,
            flavours,
            pins: BTreeMap::new(),
            status,
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(TypeTable::from_config(&config.pin_types), config.pins.clone())
    }

    // ── Registration ──────────────────────────────────────────

    /// Bind `request.index` to the owner behind `link`.
    ///
    /// On failure the error is sent through `link` and returned; the
    /// registry is left unchanged.
    pub fn register(
        &mut self,
        request: &RegisterRequest,
        mut link: Box<dyn PinLink>,
        clock: &impl Clock,
    ) -> Result<PinIndex, RegistryError> {
        let (caps, flavour) = match self.validate(request) {
            Ok((caps, flavour)) => (caps.clone(), flavour),
            Err(e) => {
                debug!("register {} rejected: {e}", request.index);
                link.error(&e);
                return Err(e);
            }
        };

        let now = clock.now_ms();
        let index = request.index;
        let registered = Registration {
            owner: request.owner.clone(),
            at: now,
            ..Registration::default()
        };
        let mut pin = Pin::new(
            index,
            &request.type_key,
            flavour.name(),
            caps.clone(),
            registered,
            link,
        );
        let mut state = PinStatus {
            type_key: Some(request.type_key.clone()),
            flavour: Some(flavour.name().to_owned()),
            caps: Some(caps.clone()),
            ..PinStatus::default()
        };
        let mut response = RegisterResponse { index, caps };

        flavour.setup(&mut pin, request, &mut state, &mut response);
        if let Some(setup) = self.types.get(&request.type_key).and_then(|t| t.setup) {
            setup(&mut pin, request, &mut state, &mut response);
        }

        if let Some(residual) = self.status.pin(index) {
            state.absorb(residual);
        }
        self.status.apply_patch(index, PinPatch::from_status(&state));

        pin.link_mut().open(&response);
        if let (SendMode::Relay, Some(value)) = (pin.send_mode, state.value) {
            pin.echo(value, state.at.unwrap_or(now));
        }

        info!(
            "pin {index} registered: type={} flavour={} owner={}",
            pin.type_key(),
            pin.flavour(),
            request.owner.as_deref().unwrap_or("-")
        );
        self.pins.insert(index, pin);
        Ok(index)
    }

    /// Check `request` in order and resolve its caps and flavour.
    fn validate(
        &self,
        request: &RegisterRequest,
    ) -> Result<(&BTreeSet<String>, &dyn Flavour), RegistryError> {
        if self.pins.contains_key(&request.index) {
            return Err(RegistryError::AlreadyRegistered(request.index));
        }
        if self.types.get(&request.type_key).is_none() {
            return Err(RegistryError::MissingCapability(request.type_key.clone()));
        }
        let caps = self
            .caps
            .get(&request.index)
            .ok_or(RegistryError::PinNotFound(request.index))?;
        if !caps.contains(&request.type_key) {
            return Err(RegistryError::MissingCapability(request.type_key.clone()));
        }
        let flavour = self
            .flavours
            .get(request.flavour_name())
            .ok_or_else(|| RegistryError::InvalidFlavour(request.flavour_name().to_owned()))?;
        Ok((caps, flavour))
    }

    /// Unbind `index`, closing its link.  The last reading stays mirrored.
    pub fn remove(&mut self, index: PinIndex) -> Result<(), RegistryError> {
        let mut pin = self
            .pins
            .remove(&index)
            .ok_or(RegistryError::InvalidPin(index))?;
        pin.link_mut().close();

        if let Some(current) = self.status.pin(index) {
            let patch = PinPatch::clear_transient(current);
            self.status.apply_patch(index, patch);
        }
        info!("pin {index} removed");
        Ok(())
    }

    // ── Value flow ────────────────────────────────────────────

    /// Raw value change reported by the master.
    pub fn update(&mut self, index: PinIndex, value: PinValue, clock: &impl Clock) {
        let now = clock.now_ms();
        if let Some(pin) = self.pins.get_mut(&index) {
            let patch = pin.send(value, now);
            self.status.apply_patch(index, patch);
        } else if self.caps.contains_key(&index) {
            self.status.apply_patch(index, PinPatch::reading(value, now));
        } else {
            error!("update dropped: {}", RegistryError::InvalidPin(index));
        }
    }

    /// Ask the master for a fresh reading of every pin whose type can poll.
    pub fn read_all(&self, master: &mut dyn MasterLink) {
        for pin in self.pins.values() {
            if let Some(read) = self.types.get(pin.type_key()).and_then(|t| t.read) {
                read(pin, master);
            }
        }
    }

    /// Refuse a command that would engage a pin while its registered
    /// conflict partner is engaged, either already or by the same command.
    pub fn check_command(&self, command: &PinCommand) -> Result<(), RegistryError> {
        for write in command.iter().filter(|w| w.value != 0) {
            let Some(conflict) = self
                .pins
                .get(&write.index)
                .and_then(|p| p.registered.conflict)
            else {
                continue;
            };
            let engaged = command.value_of(conflict).map_or_else(
                || {
                    self.status
                        .pin(conflict)
                        .and_then(|s| s.value)
                        .is_some_and(|v| v != 0)
                },
                |v| v != 0,
            );
            if engaged {
                return Err(RegistryError::ConflictEngaged {
                    index: write.index,
                    conflict,
                });
            }
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn pin(&self, index: PinIndex) -> Option<&Pin> {
        self.pins.get(&index)
    }

    pub fn is_registered(&self, index: PinIndex) -> bool {
        self.pins.contains_key(&index)
    }

    pub fn status(&self) -> &StatusTree {
        &self.status
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }
}
