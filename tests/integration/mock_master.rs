//! Test rig around the simulated master, plus a recording pin link.
//!
//! The rig owns a started [`ControlService`], a [`SimMaster`] and a
//! virtual clock, and feeds master level changes back into the service
//! after every step, like the host loop does.

use std::cell::RefCell;
use std::rc::Rc;

use homectl::adapters::sim_master::SimMaster;
use homectl::adapters::time::ManualClock;
use homectl::app::commands::BlindsCommand;
use homectl::app::ports::{Clock, PinLink};
use homectl::app::service::ControlService;
use homectl::config::ControlConfig;
use homectl::error::RegistryError;
use homectl::pins::{Direction, PinCommand, PinIndex, PinValue, Timestamp};
use homectl::registry::RegisterResponse;
use homectl::registry::pin::PinUpdate;

// ── Recording link ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LinkCall {
    Open(RegisterResponse),
    Error(RegistryError),
    Update(PinUpdate),
    Close,
}

/// [`PinLink`] whose calls stay inspectable after it is boxed away.
#[derive(Clone, Default)]
pub struct RecordingLink {
    pub calls: Rc<RefCell<Vec<LinkCall>>>,
}

#[allow(dead_code)]
impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn PinLink> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.calls.borrow().clone()
    }

    pub fn updates(&self) -> Vec<PinUpdate> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                LinkCall::Update(u) => Some(*u),
                _ => None,
            })
            .collect()
    }
}

impl PinLink for RecordingLink {
    fn open(&mut self, response: &RegisterResponse) {
        self.calls.borrow_mut().push(LinkCall::Open(response.clone()));
    }

    fn error(&mut self, error: &RegistryError) {
        self.calls.borrow_mut().push(LinkCall::Error(error.clone()));
    }

    fn update(&mut self, update: &PinUpdate) {
        self.calls.borrow_mut().push(LinkCall::Update(*update));
    }

    fn close(&mut self) {
        self.calls.borrow_mut().push(LinkCall::Close);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub const LIVING_ROOM: &str = "living-room";
pub const UP: PinIndex = PinIndex(1);
pub const DOWN: PinIndex = PinIndex(2);
pub const WATER_PIN: PinIndex = PinIndex(9);

pub struct Rig {
    pub service: ControlService,
    pub master: SimMaster,
    pub clock: ManualClock,
}

#[allow(dead_code)]
impl Rig {
    /// Default config, started at t = 0.
    pub fn new() -> Self {
        Self::with_config(&ControlConfig::default())
    }

    pub fn with_config(config: &ControlConfig) -> Self {
        let mut rig = Self::unstarted(config);
        rig.start();
        rig
    }

    pub fn unstarted(config: &ControlConfig) -> Self {
        Self {
            service: ControlService::new(config).expect("valid config"),
            master: SimMaster::new(),
            clock: ManualClock::new(0),
        }
    }

    pub fn start(&mut self) {
        self.service.start(&mut self.master, &self.clock);
        self.settle();
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_ms()
    }

    /// Deliver pending master changes until quiet.
    pub fn settle(&mut self) {
        for _ in 0..32 {
            if !self.master.has_changes() {
                return;
            }
            for c in self.master.take_changes() {
                self.service
                    .pin_changed(c.index, c.value, &mut self.master, &self.clock);
            }
        }
        panic!("feedback did not settle");
    }

    pub fn command(&mut self, command: BlindsCommand) {
        self.service
            .command(LIVING_ROOM, command, &mut self.master, &self.clock)
            .expect("known blinds");
        self.settle();
    }

    pub fn force(&mut self, index: PinIndex, value: PinValue) {
        self.master.force(index, value);
        self.settle();
    }

    /// Advance to `t`, firing every controller timer due on the way.
    pub fn run_until(&mut self, t: Timestamp) {
        while let Some(deadline) = self.service.next_deadline() {
            if deadline > t {
                break;
            }
            self.clock.set(deadline.max(self.now()));
            self.service.tick(&mut self.master, &self.clock);
            self.settle();
        }
        self.clock.set(t.max(self.now()));
    }

    pub fn moving(&self) -> Option<Direction> {
        self.service
            .blinds(LIVING_ROOM)
            .and_then(|b| b.state().moving)
            .map(|m| m.direction)
    }

    pub fn commands(&self) -> &[PinCommand] {
        &self.master.commands
    }

    pub fn mirrored(&self, index: PinIndex) -> Option<PinValue> {
        self.service
            .registry()
            .status()
            .pin(index)
            .and_then(|s| s.value)
    }
}

pub fn cmd(index: PinIndex, value: PinValue) -> PinCommand {
    PinCommand::single(index, value)
}
