//! Flow meter — pulse counter on a digital input.
//!
//! Registers its pin as `din` with the `counter` flavour; the registry
//! then delivers the running pulse count, which becomes the meter value.

use log::{debug, info};
use serde::Serialize;

use crate::app::ports::MasterLink;
use crate::config::{DIN_TYPE, FlowMeterConfig};
use crate::error::ControlFault;
use crate::pins::{PinValue, Timestamp};
use crate::registry::RegisterRequest;
use crate::registry::flavour::COUNTER_FLAVOUR;
use crate::registry::pin::PinUpdate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowMeterState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<PinValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<Timestamp>,
}

pub struct FlowMeter {
    config: FlowMeterConfig,
    state: FlowMeterState,
}

impl FlowMeter {
    pub fn new(config: FlowMeterConfig) -> Self {
        Self {
            config,
            state: FlowMeterState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn init(&self, master: &mut impl MasterLink) {
        master.register(
            RegisterRequest::new(self.config.pin, DIN_TYPE)
                .with_flavour(COUNTER_FLAVOUR)
                .with_owner(&self.config.id),
        );
        info!("flow meter {} registering pin {}", self.config.id, self.config.pin);
    }

    /// Count delivered by the registry.
    pub fn on_update(&mut self, update: &PinUpdate) -> Result<(), ControlFault> {
        if update.index != self.config.pin {
            return Err(ControlFault::InvalidPin(update.index));
        }
        debug!("flow meter {}: {} pulses", self.config.id, update.value);
        self.state = FlowMeterState {
            value: Some(update.value),
            at: Some(update.at),
        };
        Ok(())
    }

    pub fn value(&self) -> Option<PinValue> {
        self.state.value
    }

    pub fn state(&self) -> &FlowMeterState {
        &self.state
    }
}
