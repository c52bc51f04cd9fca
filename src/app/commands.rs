//! Inbound commands to the control core.
//!
//! These represent actions requested by the outside world (scripts, a
//! UI, a scheduler) that the [`ControlService`](super::service::ControlService)
//! routes to the addressed blinds controller.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pins::Direction;

/// `move` argument of a blinds controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlindsCommand {
    Up,
    Down,
    /// Release whichever direction is currently moving.
    Stop,
}

impl BlindsCommand {
    /// Direction to engage, `None` for stop.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Stop => None,
        }
    }
}

impl From<Direction> for BlindsCommand {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
        }
    }
}

impl fmt::Display for BlindsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stop => "stop",
        })
    }
}

/// Unrecognised `move` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(pub String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown blinds command '{}' (expected up, down or stop)", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for BlindsCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "stop" => Ok(Self::Stop),
            other => Err(ParseCommandError(other.to_owned())),
        }
    }
}
