//! Pin identity and the wire-level command sent to a master.
//!
//! Every module refers to physical pins through [`PinIndex`] and talks to
//! the master through [`PinCommand`] rather than passing raw integers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Raw level or count reported by a physical pin.
pub type PinValue = u32;

/// Milliseconds on the host clock (see [`Clock`](crate::app::ports::Clock)).
pub type Timestamp = u64;

/// Maximum number of pin writes carried by one command.
pub const MAX_COMMAND_WRITES: usize = 4;

// ---------------------------------------------------------------------------
// Pin index
// ---------------------------------------------------------------------------

/// Opaque identifier of a physical pin, unique within one master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinIndex(pub u16);

impl fmt::Display for PinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PinIndex {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

// ---------------------------------------------------------------------------
// Motion direction / electrical mode
// ---------------------------------------------------------------------------

/// Direction of travel of a two-pin actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Electrical role a consumer asks for when registering a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    In,
    Out,
}

// ---------------------------------------------------------------------------
// Master command
// ---------------------------------------------------------------------------

/// One `index = value` entry of a [`PinCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinWrite {
    pub index: PinIndex,
    pub value: PinValue,
}

/// Mapping from pin index to desired value, sent to the master as one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinCommand {
    writes: heapless::Vec<PinWrite, MAX_COMMAND_WRITES>,
}

impl PinCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command setting a single pin.
    pub fn single(index: PinIndex, value: PinValue) -> Self {
        let mut cmd = Self::new();
        // An empty command always has room for one write.
        let _ = cmd.push(index, value);
        cmd
    }

    /// Set `index` to `value`, replacing an earlier write to the same index.
    /// Returns `false` when the command is full.
    pub fn push(&mut self, index: PinIndex, value: PinValue) -> bool {
        if let Some(w) = self.writes.iter_mut().find(|w| w.index == index) {
            w.value = value;
            return true;
        }
        self.writes.push(PinWrite { index, value }).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinWrite> {
        self.writes.iter()
    }

    /// Value written to `index` by this command, if any.
    pub fn value_of(&self, index: PinIndex) -> Option<PinValue> {
        self.writes.iter().find(|w| w.index == index).map(|w| w.value)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl fmt::Display for PinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, w) in self.writes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", w.index, w.value)?;
        }
        write!(f, "}}")
    }
}
