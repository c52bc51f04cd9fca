//! Application core — domain orchestration, zero I/O.
//!
//! Routes master feedback and operator commands to the pin registry and
//! the consumers bound to it.  All interaction with the master device
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real hardware.

pub mod commands;
pub mod ports;
pub mod service;
