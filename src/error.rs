//! Unified error types for the control core.
//!
//! Registration-time failures ([`RegistryError`]) are caller errors and are
//! handed back through the response channel.  Runtime inconsistencies found
//! while processing feedback ([`ControlFault`]) are never propagated; the
//! controller logs them and discards the offending local state.

use core::fmt;

use crate::pins::{Direction, PinIndex, PinValue};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A pin registry operation was rejected.
    Registry(RegistryError),
    /// A controller detected an inconsistency.
    Control(ControlFault),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// No consumer with this id is configured.
    UnknownEntry(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Control(e) => write!(f, "control: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::UnknownEntry(id) => write!(f, "unknown entry '{id}'"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The index is already bound to another owner.
    AlreadyRegistered(PinIndex),
    /// The type is unknown, or the pin does not support it.
    MissingCapability(String),
    /// The index is not exposed by the master.
    PinNotFound(PinIndex),
    /// The flavour name has no registered implementation.
    InvalidFlavour(String),
    /// The index is not (or no longer) registered.
    InvalidPin(PinIndex),
    /// A command would engage a pin while its conflict partner is engaged.
    ConflictEngaged { index: PinIndex, conflict: PinIndex },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered(index) => write!(f, "pin {index} already registered"),
            Self::MissingCapability(ty) => write!(f, "missing capability '{ty}'"),
            Self::PinNotFound(index) => write!(f, "pin {index} not found"),
            Self::InvalidFlavour(name) => write!(f, "invalid flavour '{name}'"),
            Self::InvalidPin(index) => write!(f, "invalid pin {index}"),
            Self::ConflictEngaged { index, conflict } => {
                write!(f, "pin {index} conflicts with engaged pin {conflict}")
            }
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Control faults
// ---------------------------------------------------------------------------

/// Conditions a controller logs and recovers from on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFault {
    /// Feedback did not match the request awaiting confirmation.
    StaleRequest {
        direction: Direction,
        value: PinValue,
    },
    /// The master did not confirm a command before the ack timer expired.
    UnfulfilledRequest {
        direction: Direction,
        value: PinValue,
    },
    /// A timer was still armed when a new command was sent.
    UnexpectedTimer,
    /// A timer fired after it had been superseded.
    StaleTimer,
    /// A send was attempted without a pending request.
    NoRequest,
    /// The hold timer fired but the request was no longer engaged.
    InvalidRequest,
    /// Feedback or an update arrived for a pin the consumer does not own.
    InvalidPin(PinIndex),
}

impl fmt::Display for ControlFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleRequest { direction, value } => {
                write!(f, "stale request {direction}={value} discarded")
            }
            Self::UnfulfilledRequest { direction, value } => {
                write!(f, "master did not fulfil request {direction}={value}")
            }
            Self::UnexpectedTimer => write!(f, "timer was still pending"),
            Self::StaleTimer => write!(f, "timer was not cleared"),
            Self::NoRequest => write!(f, "no request to send"),
            Self::InvalidRequest => write!(f, "invalid request on hold timeout"),
            Self::InvalidPin(index) => write!(f, "invalid pin {index}"),
        }
    }
}

impl From<ControlFault> for Error {
    fn from(e: ControlFault) -> Self {
        Self::Control(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
