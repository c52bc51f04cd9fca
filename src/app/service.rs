//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns the pin registry of one master together with
//! every consumer bound to it (blinds controllers, flow meters).  It wires
//! consumer registrations through the registry, routes registry traffic
//! back to the owning consumer, and exposes a hardware-agnostic API.  All
//! I/O flows through port traits injected at call sites.
//!
//! ```text
//!  master change ──▶ ┌──────────────────────────┐ ──▶ MasterLink (commands)
//!                    │      ControlService       │
//!  move command  ──▶ │ Registry · Blinds · Flow  │
//!                    └─────────────┬────────────┘
//!                                  ▼
//!                               Inbox ──▶ owner by id
//! ```

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;

use crate::adapters::inbox::{Inbox, InboxMessage};
use crate::adapters::log_sink::LogPinLink;
use crate::blinds::{BlindsController, BlindsState, PinFeedback};
use crate::config::ControlConfig;
use crate::error::{Error, Result};
use crate::flow_meter::{FlowMeter, FlowMeterState};
use crate::pins::{Direction, PinCommand, PinIndex, PinValue, Timestamp};
use crate::registry::pin::PinUpdate;
use crate::registry::{PinRegistry, RegisterRequest};
use crate::status::StatusTree;

use super::commands::BlindsCommand;
use super::ports::{Clock, MasterLink, PinLink};

// ───────────────────────────────────────────────────────────────
// Status surface
// ───────────────────────────────────────────────────────────────

/// Everything observable about one master and its consumers.
#[derive(Debug, Serialize)]
pub struct StatusView<'a> {
    #[serde(flatten)]
    pub tree: &'a StatusTree,
    pub blinds: BTreeMap<&'a str, &'a BlindsState>,
    #[serde(rename = "flowMeters")]
    pub flow_meters: BTreeMap<&'a str, &'a FlowMeterState>,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

pub struct ControlService {
    registry: PinRegistry,
    blinds: Vec<BlindsController>,
    flow_meters: Vec<FlowMeter>,
    inbox: Inbox,
    tick_interval_ms: u32,
}

impl ControlService {
    /// Construct the service from configuration.
    ///
    /// Does **not** register anything yet; call [`start`](Self::start) next.
    pub fn new(config: &ControlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: PinRegistry::from_config(config),
            blinds: config
                .blinds
                .iter()
                .cloned()
                .map(BlindsController::new)
                .collect(),
            flow_meters: config
                .flow_meters
                .iter()
                .cloned()
                .map(FlowMeter::new)
                .collect(),
            inbox: Inbox::new(),
            tick_interval_ms: config.tick_interval_ms,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Register every consumer's pins.
    pub fn start(&mut self, master: &mut impl MasterLink, clock: &impl Clock) {
        for b in &self.blinds {
            b.init(&mut Registrar {
                registry: &mut self.registry,
                inbox: &self.inbox,
                master: &mut *master,
                clock,
            });
        }
        for m in &self.flow_meters {
            m.init(&mut Registrar {
                registry: &mut self.registry,
                inbox: &self.inbox,
                master: &mut *master,
                clock,
            });
        }
        self.dispatch(master, clock);
        info!(
            "ControlService started: {} blinds, {} flow meters",
            self.blinds.len(),
            self.flow_meters.len()
        );
    }

    // ── Inbound ───────────────────────────────────────────────

    /// A pin level reported by the master.
    pub fn pin_changed(
        &mut self,
        index: PinIndex,
        value: PinValue,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        self.registry.update(index, value, clock);
        self.dispatch(master, clock);
    }

    /// Route `move(command)` to the blinds controller `id`.
    pub fn command(
        &mut self,
        id: &str,
        command: BlindsCommand,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) -> Result<()> {
        let b = self
            .blinds
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| Error::UnknownEntry(id.to_owned()))?;
        b.move_to(
            command,
            &mut Registrar {
                registry: &mut self.registry,
                inbox: &self.inbox,
                master: &mut *master,
                clock,
            },
            clock,
        );
        self.dispatch(master, clock);
        Ok(())
    }

    /// Engage blinds `id` towards `direction` for at most `timeout_ms`.
    pub fn move_for(
        &mut self,
        id: &str,
        direction: Direction,
        timeout_ms: u32,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) -> Result<()> {
        let b = self
            .blinds
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| Error::UnknownEntry(id.to_owned()))?;
        b.move_for(
            direction,
            timeout_ms,
            &mut Registrar {
                registry: &mut self.registry,
                inbox: &self.inbox,
                master: &mut *master,
                clock,
            },
            clock,
        );
        self.dispatch(master, clock);
        Ok(())
    }

    /// Register a pin for an owner outside the service.
    pub fn register_pin(
        &mut self,
        request: &RegisterRequest,
        link: Box<dyn PinLink>,
        clock: &impl Clock,
    ) -> Result<PinIndex> {
        Ok(self.registry.register(request, link, clock)?)
    }

    pub fn remove_pin(&mut self, index: PinIndex) -> Result<()> {
        Ok(self.registry.remove(index)?)
    }

    /// Ask the master to sample every pollable pin.
    pub fn read_all(&mut self, master: &mut impl MasterLink) {
        self.registry.read_all(master);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Fire every due controller timer.
    pub fn tick(&mut self, master: &mut impl MasterLink, clock: &impl Clock) {
        for b in &mut self.blinds {
            b.poll(
                &mut Registrar {
                    registry: &mut self.registry,
                    inbox: &self.inbox,
                    master: &mut *master,
                    clock,
                },
                clock,
            );
        }
        self.dispatch(master, clock);
    }

    /// Earliest armed controller deadline, if any.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.blinds.iter().filter_map(BlindsController::next_deadline).min()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    pub fn blinds(&self, id: &str) -> Option<&BlindsController> {
        self.blinds.iter().find(|b| b.id() == id)
    }

    pub fn flow_meter(&self, id: &str) -> Option<&FlowMeter> {
        self.flow_meters.iter().find(|m| m.id() == id)
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.tick_interval_ms
    }

    pub fn status(&self) -> StatusView<'_> {
        StatusView {
            tree: self.registry.status(),
            blinds: self.blinds.iter().map(|b| (b.id(), b.state())).collect(),
            flow_meters: self
                .flow_meters
                .iter()
                .map(|m| (m.id(), m.state()))
                .collect(),
        }
    }

    pub fn status_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.status())
    }

    // ── Internal ──────────────────────────────────────────────

    /// Deliver queued registry traffic to its owners.
    fn dispatch(&mut self, master: &mut impl MasterLink, clock: &impl Clock) {
        while let Some(message) = self.inbox.pop() {
            match message {
                InboxMessage::Update { owner, update } => {
                    self.deliver(&owner, &update, master, clock);
                }
                InboxMessage::Opened { owner, response } => {
                    debug!("{owner}: pin {} open", response.index);
                }
                // Logged by the registry.
                InboxMessage::Failed { .. } => {}
                InboxMessage::Closed { owner, index } => {
                    debug!("{owner}: pin {index} closed");
                }
            }
        }
    }

    fn deliver(
        &mut self,
        owner: &str,
        update: &PinUpdate,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        if let Some(b) = self.blinds.iter_mut().find(|b| b.id() == owner) {
            b.on_feedback(
                &PinFeedback::from(update),
                &mut Registrar {
                    registry: &mut self.registry,
                    inbox: &self.inbox,
                    master,
                    clock,
                },
                clock,
            );
        } else if let Some(m) = self.flow_meters.iter_mut().find(|m| m.id() == owner) {
            if let Err(e) = m.on_update(update) {
                warn!("flow meter {owner}: {e}");
            }
        } else {
            debug!("update for external owner {owner} on pin {}", update.index);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Registrar
// ───────────────────────────────────────────────────────────────

/// [`MasterLink`] handed to consumers: registrations go to the registry,
/// commands pass the interlock check before reaching the master.
struct Registrar<'a, M, C> {
    registry: &'a mut PinRegistry,
    inbox: &'a Inbox,
    master: &'a mut M,
    clock: &'a C,
}

impl<M: MasterLink, C: Clock> MasterLink for Registrar<'_, M, C> {
    fn write(&mut self, command: &PinCommand) {
        match self.registry.check_command(command) {
            Ok(()) => self.master.write(command),
            Err(e) => warn!("command {command} refused: {e}"),
        }
    }

    fn register(&mut self, request: RegisterRequest) {
        let owner = request.owner.clone().unwrap_or_default();
        let link = LogPinLink::new(&owner, self.inbox.link(&owner, request.index));
        // A rejection already reached the owner through its link.
        if self.registry.register(&request, Box::new(link), self.clock).is_ok() {
            self.master.register(request);
        }
    }

    fn read(&mut self, index: PinIndex) {
        self.master.read(index);
    }
}
