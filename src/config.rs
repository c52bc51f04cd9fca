//! Control configuration.
//!
//! Describes one master: the pin types it understands, the capability set of
//! every physical pin it exposes, and the consumers (blinds, flow meters)
//! bound to those pins.  Loaded from JSON by the host binary.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::PinIndex;

/// Hold time after which an engaged blinds motor is released.
pub const DEFAULT_HOLD_TIMEOUT_MS: u32 = 6000;
/// Time the master has to confirm a command.
pub const DEFAULT_ACK_TIMEOUT_MS: u32 = 1000;

/// Type key blinds pins are registered with.
pub const DIGITAL_TYPE: &str = "digital";
/// Type key flow meter pins are registered with.
pub const DIN_TYPE: &str = "din";

/// Display information for a pin type.  `name` defaults to the type key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinTypeConfig {
    #[serde(default)]
    pub name: Option<String>,
}

/// One blinds actuator driven by two interlocked output pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindsConfig {
    /// Identity used as pin owner and command target.
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Pin that drives the motor up.
    pub up: PinIndex,
    /// Pin that drives the motor down.
    pub down: PinIndex,
    /// Maximum time a confirmed motion may continue (ms).
    #[serde(default = "default_hold_timeout_ms")]
    pub hold_timeout_ms: u32,
    /// Time allowed for pin feedback after a command (ms).
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u32,
}

impl BlindsConfig {
    pub fn new(id: &str, up: PinIndex, down: PinIndex) -> Self {
        Self {
            id: id.to_owned(),
            caption: None,
            up,
            down,
            hold_timeout_ms: DEFAULT_HOLD_TIMEOUT_MS,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
        }
    }

    /// Caption used in registrations, falling back to the id.
    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.id)
    }
}

/// A pulse-counting flow meter on a digital input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMeterConfig {
    pub id: String,
    pub pin: PinIndex,
}

/// Everything needed to bring up one master and its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Pin types keyed by type key.
    pub pin_types: BTreeMap<String, PinTypeConfig>,
    /// Capability set (supported type keys) of every physical pin.
    pub pins: BTreeMap<PinIndex, BTreeSet<String>>,
    #[serde(default)]
    pub blinds: Vec<BlindsConfig>,
    #[serde(default)]
    pub flow_meters: Vec<FlowMeterConfig>,
    /// Host tick period used to poll controller timers (ms).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
}

fn default_hold_timeout_ms() -> u32 {
    DEFAULT_HOLD_TIMEOUT_MS
}

fn default_ack_timeout_ms() -> u32 {
    DEFAULT_ACK_TIMEOUT_MS
}

fn default_tick_interval_ms() -> u32 {
    100
}

impl Default for ControlConfig {
    fn default() -> Self {
        let mut pin_types = BTreeMap::new();
        pin_types.insert(
            DIGITAL_TYPE.to_owned(),
            PinTypeConfig {
                name: Some("Digital I/O".to_owned()),
            },
        );
        pin_types.insert(DIN_TYPE.to_owned(), PinTypeConfig::default());

        // 1–8 relay outputs, 9–10 opto-isolated inputs.
        let mut pins = BTreeMap::new();
        for i in 1..=8 {
            pins.insert(PinIndex(i), BTreeSet::from([DIGITAL_TYPE.to_owned()]));
        }
        for i in 9..=10 {
            pins.insert(
                PinIndex(i),
                BTreeSet::from([DIGITAL_TYPE.to_owned(), DIN_TYPE.to_owned()]),
            );
        }

        let mut living_room = BlindsConfig::new("living-room", PinIndex(1), PinIndex(2));
        living_room.caption = Some("Living room blinds".to_owned());

        Self {
            pin_types,
            pins,
            blinds: vec![living_room],
            flow_meters: vec![FlowMeterConfig {
                id: "water".to_owned(),
                pin: PinIndex(9),
            }],
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl ControlConfig {
    /// Reject configurations the control core cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be > 0"));
        }

        let mut ids = BTreeSet::new();
        let mut used = BTreeSet::new();

        for b in &self.blinds {
            if !ids.insert(b.id.as_str()) {
                return Err(ConfigError::ValidationFailed("duplicate consumer id"));
            }
            if b.up == b.down {
                return Err(ConfigError::ValidationFailed("blinds up and down pins must differ"));
            }
            if b.hold_timeout_ms == 0 || b.ack_timeout_ms == 0 {
                return Err(ConfigError::ValidationFailed("blinds timeouts must be > 0"));
            }
            if !self.pin_types.contains_key(DIGITAL_TYPE) {
                return Err(ConfigError::ValidationFailed("blinds need the 'digital' pin type"));
            }
            for pin in [b.up, b.down] {
                if !self.supports(pin, DIGITAL_TYPE) {
                    return Err(ConfigError::ValidationFailed("blinds pin lacks 'digital' capability"));
                }
                if !used.insert(pin) {
                    return Err(ConfigError::ValidationFailed("pin assigned to more than one consumer"));
                }
            }
        }

        for m in &self.flow_meters {
            if !ids.insert(m.id.as_str()) {
                return Err(ConfigError::ValidationFailed("duplicate consumer id"));
            }
            if !self.pin_types.contains_key(DIN_TYPE) || !self.supports(m.pin, DIN_TYPE) {
                return Err(ConfigError::ValidationFailed("flow meter pin lacks 'din' capability"));
            }
            if !used.insert(m.pin) {
                return Err(ConfigError::ValidationFailed("pin assigned to more than one consumer"));
            }
        }

        Ok(())
    }

    fn supports(&self, pin: PinIndex, type_key: &str) -> bool {
        self.pins.get(&pin).is_some_and(|caps| caps.contains(type_key))
    }
}
