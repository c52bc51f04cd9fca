//! In-memory master device.
//!
//! Applies every command to its pin levels immediately and queues the
//! resulting level changes, which the host hands back to the service as
//! pin feedback.  Records every call so tests and the simulator can
//! inspect the full history.

use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::app::ports::MasterLink;
use crate::pins::{PinCommand, PinIndex, PinValue};
use crate::registry::RegisterRequest;

/// A level change reported by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinChange {
    pub index: PinIndex,
    pub value: PinValue,
}

pub struct SimMaster {
    levels: BTreeMap<PinIndex, PinValue>,
    changes: VecDeque<PinChange>,
    /// When `false`, commands are recorded but never executed.
    responsive: bool,
    pub commands: Vec<PinCommand>,
    pub registrations: Vec<RegisterRequest>,
    pub reads: Vec<PinIndex>,
}

impl Default for SimMaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMaster {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
            changes: VecDeque::new(),
            responsive: true,
            commands: Vec::new(),
            registrations: Vec::new(),
            reads: Vec::new(),
        }
    }

    pub fn set_responsive(&mut self, responsive: bool) {
        self.responsive = responsive;
    }

    pub fn level(&self, index: PinIndex) -> PinValue {
        self.levels.get(&index).copied().unwrap_or(0)
    }

    /// Drive a pin from outside the control core (manual switch, sensor).
    pub fn force(&mut self, index: PinIndex, value: PinValue) {
        self.set_level(index, value);
    }

    /// One full pulse on an input pin.
    pub fn pulse(&mut self, index: PinIndex) {
        self.set_level(index, 1);
        self.set_level(index, 0);
    }

    pub fn take_changes(&mut self) -> Vec<PinChange> {
        self.changes.drain(..).collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn last_command(&self) -> Option<&PinCommand> {
        self.commands.last()
    }

    fn set_level(&mut self, index: PinIndex, value: PinValue) {
        let old = self.levels.insert(index, value).unwrap_or(0);
        if old != value {
            self.changes.push_back(PinChange { index, value });
        }
    }
}

impl MasterLink for SimMaster {
    fn write(&mut self, command: &PinCommand) {
        debug!("SIM  | write {command}");
        self.commands.push(command.clone());
        if self.responsive {
            for w in command.iter() {
                self.set_level(w.index, w.value);
            }
        }
    }

    fn register(&mut self, request: RegisterRequest) {
        self.registrations.push(request);
    }

    fn read(&mut self, index: PinIndex) {
        self.reads.push(index);
        let value = self.level(index);
        self.changes.push_back(PinChange { index, value });
    }
}
