//! Port traits — the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   BlindsController ──▶ MasterLink ──▶ master device
//!   PinRegistry      ──▶ PinLink    ──▶ pin owner
//!   everything       ──▶ Clock
//! ```
//!
//! Adapters implement these traits; the core consumes them via generics or
//! trait objects and never touches transport or hardware directly.

use crate::error::RegistryError;
use crate::pins::{PinCommand, PinIndex, Timestamp};
use crate::registry::pin::PinUpdate;
use crate::registry::{RegisterRequest, RegisterResponse};

// ───────────────────────────────────────────────────────────────
// Master link (driven adapter: core → master device)
// ───────────────────────────────────────────────────────────────

/// Outbound channel to the master that owns the physical pins.
///
/// Delivery is assumed reliable and ordered; the core never retries.
pub trait MasterLink {
    /// Drive one or more pins to the given values.
    fn write(&mut self, command: &PinCommand);

    /// Ask the master to bind a pin to the caller.
    fn register(&mut self, request: RegisterRequest);

    /// Ask the master to sample a pin and report its level.
    fn read(&mut self, index: PinIndex) {
        let _ = index;
    }
}

// ───────────────────────────────────────────────────────────────
// Pin link (driven adapter: registry → pin owner)
// ───────────────────────────────────────────────────────────────

/// Response channel handed to [`PinRegistry::register`](crate::registry::PinRegistry::register).
///
/// Receives either `error` or `open` exactly once, then a stream of
/// `update`s for the lifetime of the pin, then `close` on removal.
pub trait PinLink {
    fn open(&mut self, response: &RegisterResponse);

    fn error(&mut self, error: &RegistryError);

    fn update(&mut self, update: &PinUpdate);

    fn close(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}
