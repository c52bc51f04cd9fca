//! Single-slot, tick-polled timer with generation tokens.
//!
//! Each controller owns one [`TimerSlot`].  Arming always supersedes the
//! previous timer; every arm hands out a fresh [`TimerToken`], and a firing
//! is only honoured when its token is still the armed one.
//!
//! ```text
//!   arm(Ack, now, 1000) ──▶ token #7 ──┐
//!   arm(Hold, now, 6000) ─▶ token #8   │  #7 superseded
//!                                      ▼
//!   take_if_current(#7) ──▶ None  (stale, ignored)
//!   take_if_current(#8) ──▶ Some(Hold)
//! ```
//!
//! The slot has no clock of its own: the host either polls
//! [`TimerSlot::due`] from its tick loop, or schedules a callback for
//! [`TimerSlot::deadline`] and hands the token back.

use core::fmt;

use serde::Serialize;

use crate::pins::Timestamp;

/// Opaque identity of one arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerToken(u32);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an armed timer is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Master acknowledgement of the last command.
    Ack,
    /// Safety cutoff of a confirmed motion.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    token: TimerToken,
    kind: TimerKind,
    deadline: Timestamp,
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    next: u32,
    armed: Option<Armed>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `after_ms` from `now`, replacing whatever was armed.
    pub fn arm(&mut self, kind: TimerKind, now: Timestamp, after_ms: u32) -> TimerToken {
        self.next = self.next.wrapping_add(1);
        let token = TimerToken(self.next);
        self.armed = Some(Armed {
            token,
            kind,
            deadline: now.saturating_add(u64::from(after_ms)),
        });
        token
    }

    /// Disarm.  Returns `true` if a timer was armed.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.armed.map(|a| a.token)
    }

    pub fn kind(&self) -> Option<TimerKind> {
        self.armed.map(|a| a.kind)
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        self.armed.map(|a| a.deadline)
    }

    /// Consume the armed timer if `token` is the current one.
    pub fn take_if_current(&mut self, token: TimerToken) -> Option<TimerKind> {
        match self.armed {
            Some(a) if a.token == token => {
                self.armed = None;
                Some(a.kind)
            }
            _ => None,
        }
    }

    /// Token of the armed timer if its deadline has passed.
    pub fn due(&self, now: Timestamp) -> Option<TimerToken> {
        self.armed
            .filter(|a| now >= a.deadline)
            .map(|a| a.token)
    }
}
