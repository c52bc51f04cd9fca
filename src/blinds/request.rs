//! Blinds motion requests and the bounded (current, pending) queue.

use heapless::Deque;
use serde::Serialize;

use crate::pins::{Direction, PinValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Adopted, not yet sent.
    New,
    /// Command sent, awaiting pin feedback.
    Confirm,
    /// Feedback received, motion active until the hold timer or a stop.
    Do,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlindsRequest {
    pub direction: Direction,
    /// `1` engage, `0` release.
    pub value: PinValue,
    pub state: RequestState,
    /// Hold time override for this request (ms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u32>,
}

impl BlindsRequest {
    pub fn engage(direction: Direction) -> Self {
        Self {
            direction,
            value: 1,
            state: RequestState::New,
            timeout_ms: None,
        }
    }

    pub fn release(direction: Direction) -> Self {
        Self {
            value: 0,
            ..Self::engage(direction)
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn is_engage(&self) -> bool {
        self.value != 0
    }
}

/// At most two requests: the one in flight and the one chained behind it.
#[derive(Debug, Default)]
pub struct RequestQueue {
    slots: Deque<BlindsRequest, 2>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&BlindsRequest> {
        self.slots.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut BlindsRequest> {
        self.slots.front_mut()
    }

    pub fn pending(&self) -> Option<&BlindsRequest> {
        self.slots.back().filter(|_| self.slots.len() == 2)
    }

    /// Replace both slots.
    pub fn set(&mut self, current: BlindsRequest, pending: Option<BlindsRequest>) {
        self.slots.clear();
        // Capacity is two and the deque was just cleared.
        let _ = self.slots.push_back(current);
        if let Some(next) = pending {
            let _ = self.slots.push_back(next);
        }
    }

    /// Drop the current request and hand back whatever was chained behind it.
    pub fn take_pending(&mut self) -> Option<BlindsRequest> {
        self.slots.pop_front();
        let next = self.slots.pop_front();
        self.slots.clear();
        next
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
