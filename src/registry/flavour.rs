//! Pin flavours.
//!
//! A flavour is the behaviour attached to a pin at registration.  The set is
//! closed: implementations are registered in a [`FlavourTable`] when the
//! registry is built, and an unknown name is rejected at registration.

use std::collections::BTreeMap;

use crate::status::PinStatus;

use super::pin::{Pin, SendMode};
use super::{RegisterRequest, RegisterResponse};

pub const DIGITAL_FLAVOUR: &str = "digital";
pub const COUNTER_FLAVOUR: &str = "counter";

pub trait Flavour {
    fn name(&self) -> &'static str;

    /// Prepare `pin` for use.  May adjust the mirrored `state` and the
    /// `response` returned to the owner.
    fn setup(
        &self,
        pin: &mut Pin,
        request: &RegisterRequest,
        state: &mut PinStatus,
        response: &mut RegisterResponse,
    );
}

/// Direct relay of pin levels.  Records electrical mode and interlock partner.
pub struct DigitalFlavour;

impl Flavour for DigitalFlavour {
    fn name(&self) -> &'static str {
        DIGITAL_FLAVOUR
    }

    fn setup(
        &self,
        pin: &mut Pin,
        request: &RegisterRequest,
        state: &mut PinStatus,
        _response: &mut RegisterResponse,
    ) {
        pin.send_mode = SendMode::Relay;
        pin.registered.mode = request.mode;
        pin.registered.conflict = request.conflict;
        pin.registered.caption.clone_from(&request.caption);
        state.registered = Some(pin.registered.clone());
    }
}

/// Pulse accumulation: the owner receives the number of rising edges.
pub struct CounterFlavour;

impl Flavour for CounterFlavour {
    fn name(&self) -> &'static str {
        COUNTER_FLAVOUR
    }

    fn setup(
        &self,
        pin: &mut Pin,
        request: &RegisterRequest,
        state: &mut PinStatus,
        _response: &mut RegisterResponse,
    ) {
        pin.send_mode = SendMode::Counter {
            count: 0,
            level: None,
        };
        pin.registered.caption.clone_from(&request.caption);
        state.registered = Some(pin.registered.clone());
    }
}

/// Flavour name → implementation.
pub struct FlavourTable {
    flavours: BTreeMap<&'static str, Box<dyn Flavour>>,
}

impl FlavourTable {
    pub fn empty() -> Self {
        Self {
            flavours: BTreeMap::new(),
        }
    }

    /// The flavours every registry ships with.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert(Box::new(DigitalFlavour));
        table.insert(Box::new(CounterFlavour));
        table
    }

    pub fn insert(&mut self, flavour: Box<dyn Flavour>) {
        self.flavours.insert(flavour.name(), flavour);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Flavour> {
        self.flavours.get(name).map(|f| &**f)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flavours.contains_key(name)
    }
}

impl Default for FlavourTable {
    fn default() -> Self {
        Self::builtin()
    }
}
