//! Blinds controller — direction-interlocked motor control over two pins.
//!
//! One controller per blinds actuator.  It owns two digital output pins
//! (`up`, `down`) registered as each other's conflict partner, and turns
//! pin feedback into a request / confirm / timeout protocol:
//!
//! ```text
//!   move(up) ──▶ request{up,1} ──▶ send {up:1} ──▶ Confirm ─┬─ ack timer
//!                                                           │
//!   feedback up=1 ──▶ moving=up ──▶ Do ──▶ hold timer ──────┘
//!                                            │ expires
//!                                            ▼
//!                                     send {up:0} (cutoff)
//!
//!   move(down) while moving up:
//!       request{up,0} + pending{down,1} ──▶ send {up:0}
//!       feedback up=0 ──▶ start pending ──▶ send {down:1}
//! ```
//!
//! Inconsistencies (stale requests, unknown pins, stray timers) are logged
//! and repaired locally; nothing here returns an error to the caller.

pub mod request;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::commands::BlindsCommand;
use crate::app::ports::{Clock, MasterLink};
use crate::config::{BlindsConfig, DIGITAL_TYPE};
use crate::error::ControlFault;
use crate::pins::{Direction, PinCommand, PinIndex, PinMode, PinValue, Timestamp};
use crate::registry::RegisterRequest;
use crate::registry::pin::PinUpdate;
use crate::timer::{TimerKind, TimerSlot, TimerToken};

use self::request::{BlindsRequest, RequestQueue, RequestState};

/// Confirmed change of one of the controller's pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFeedback {
    pub pin: PinIndex,
    pub value: PinValue,
    /// Replay of an existing reading at registration time.
    pub registering: bool,
}

impl PinFeedback {
    pub fn new(pin: PinIndex, value: PinValue) -> Self {
        Self {
            pin,
            value,
            registering: false,
        }
    }
}

impl From<&PinUpdate> for PinFeedback {
    fn from(u: &PinUpdate) -> Self {
        Self {
            pin: u.index,
            value: u.value,
            registering: u.registering,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Motion {
    pub direction: Direction,
    pub start: Timestamp,
}

/// Published state of one blinds actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlindsState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving: Option<Motion>,
}

pub struct BlindsController {
    config: BlindsConfig,
    state: BlindsState,
    requests: RequestQueue,
    timer: TimerSlot,
}

impl BlindsController {
    pub fn new(config: BlindsConfig) -> Self {
        Self {
            config,
            state: BlindsState::default(),
            requests: RequestQueue::new(),
            timer: TimerSlot::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &BlindsConfig {
        &self.config
    }

    pub fn state(&self) -> &BlindsState {
        &self.state
    }

    pub fn request(&self) -> Option<&BlindsRequest> {
        self.requests.current()
    }

    pub fn pending(&self) -> Option<&BlindsRequest> {
        self.requests.pending()
    }

    pub fn timer(&self) -> &TimerSlot {
        &self.timer
    }

    pub fn owns(&self, pin: PinIndex) -> bool {
        pin == self.config.up || pin == self.config.down
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Register both motor pins as mutually conflicting outputs.
    pub fn init(&self, master: &mut impl MasterLink) {
        let caption = self.config.caption();
        for (pin, partner, suffix) in [
            (self.config.up, self.config.down, "Up"),
            (self.config.down, self.config.up, "Down"),
        ] {
            master.register(
                RegisterRequest::new(pin, DIGITAL_TYPE)
                    .with_mode(PinMode::Out)
                    .with_conflict(partner)
                    .with_caption(&format!("{caption} {suffix}"))
                    .with_owner(&self.config.id),
            );
        }
        info!(
            "blinds {} registering up={} down={}",
            self.config.id, self.config.up, self.config.down
        );
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Pin feedback from the master.
    pub fn on_feedback(
        &mut self,
        feedback: &PinFeedback,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        if feedback.registering && feedback.value != 0 {
            info!(
                "blinds {}: pin {} engaged at registration, releasing",
                self.config.id, feedback.pin
            );
            master.write(&PinCommand::single(feedback.pin, 0));
            return;
        }

        let direction = self.direction_of(feedback.pin);
        self.timer.cancel();
        let Some(direction) = direction else {
            return;
        };
        let engaged = feedback.value != 0;

        let stale = self.requests.current().copied().filter(|req| {
            req.state != RequestState::Do
                && (req.direction != direction || req.is_engage() != engaged)
        });
        if let Some(req) = stale {
            warn!(
                "blinds {}: {}",
                self.config.id,
                ControlFault::StaleRequest {
                    direction: req.direction,
                    value: req.value,
                }
            );
            self.requests.clear();
        }

        if engaged {
            self.state.moving = Some(Motion {
                direction,
                start: clock.now_ms(),
            });
            debug!("blinds {}: moving {direction}", self.config.id);

            if self.requests.is_empty() {
                self.start_request(Some(BlindsRequest::engage(direction)), master, clock);
            } else {
                self.confirm_request(clock);
            }
        } else {
            if self.state.moving.is_some_and(|m| m.direction == direction) {
                self.state.moving = None;
                debug!("blinds {}: stopped", self.config.id);
            }
            if !self.requests.is_empty() {
                let next = self.requests.take_pending();
                self.start_request(next, master, clock);
            }
        }
    }

    /// `move(up | down | stop)`.
    pub fn move_to(
        &mut self,
        command: BlindsCommand,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        info!("blinds {}: move {command}", self.config.id);
        match command.direction() {
            Some(direction) => {
                self.start_request(Some(BlindsRequest::engage(direction)), master, clock);
            }
            None => match self.state.moving {
                Some(m) => {
                    self.start_request(Some(BlindsRequest::release(m.direction)), master, clock);
                }
                None => debug!("blinds {}: stop while idle ignored", self.config.id),
            },
        }
    }

    /// Engage `direction` with a hold time other than the configured one.
    pub fn move_for(
        &mut self,
        direction: Direction,
        timeout_ms: u32,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        info!(
            "blinds {}: move {direction} for {timeout_ms} ms",
            self.config.id
        );
        let request = BlindsRequest::engage(direction).with_timeout(timeout_ms);
        self.start_request(Some(request), master, clock);
    }

    // ── Timers ────────────────────────────────────────────────

    /// Fire the timer identified by `token`.  Superseded tokens are ignored.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        match self.timer.take_if_current(token) {
            None => warn!(
                "blinds {}: {} ({token})",
                self.config.id,
                ControlFault::StaleTimer
            ),
            Some(TimerKind::Ack) => match self.requests.current() {
                Some(req) => warn!(
                    "blinds {}: {}",
                    self.config.id,
                    ControlFault::UnfulfilledRequest {
                        direction: req.direction,
                        value: req.value,
                    }
                ),
                None => debug!("blinds {}: ack timer without request", self.config.id),
            },
            Some(TimerKind::Hold) => match self.requests.current_mut() {
                Some(req) if req.is_engage() && req.state == RequestState::Do => {
                    info!(
                        "blinds {}: hold time over, releasing {}",
                        self.config.id, req.direction
                    );
                    req.value = 0;
                    self.send_request(master, clock);
                }
                _ => warn!(
                    "blinds {}: {}",
                    self.config.id,
                    ControlFault::InvalidRequest
                ),
            },
        }
    }

    /// Fire the timer if its deadline has passed.  Returns `true` if it fired.
    pub fn poll(&mut self, master: &mut impl MasterLink, clock: &impl Clock) -> bool {
        match self.timer.due(clock.now_ms()) {
            Some(token) => {
                self.on_timer(token, master, clock);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timer.deadline()
    }

    // ── Helpers ───────────────────────────────────────────────

    /// `up` / `down` for the configured pins; anything else is logged.
    pub fn direction_of(&self, pin: PinIndex) -> Option<Direction> {
        if pin == self.config.up {
            Some(Direction::Up)
        } else if pin == self.config.down {
            Some(Direction::Down)
        } else {
            warn!(
                "blinds {}: {}",
                self.config.id,
                ControlFault::InvalidPin(pin)
            );
            None
        }
    }

    fn pin_of(&self, direction: Direction) -> PinIndex {
        match direction {
            Direction::Up => self.config.up,
            Direction::Down => self.config.down,
        }
    }

    fn start_request(
        &mut self,
        request: Option<BlindsRequest>,
        master: &mut impl MasterLink,
        clock: &impl Clock,
    ) {
        self.timer.cancel();

        let Some(request) = request else {
            self.requests.clear();
            return;
        };

        match self.state.moving {
            Some(moving) if request.is_engage() && moving.direction == request.direction => {
                // Motor already runs the requested way.
                self.requests.set(request, None);
                self.confirm_request(clock);
            }
            Some(moving) if request.is_engage() => {
                self.requests
                    .set(BlindsRequest::release(moving.direction), Some(request));
                self.send_request(master, clock);
            }
            _ => {
                self.requests.set(request, None);
                self.send_request(master, clock);
            }
        }
    }

    fn send_request(&mut self, master: &mut impl MasterLink, clock: &impl Clock) {
        let Some(req) = self.requests.current_mut() else {
            warn!("blinds {}: {}", self.config.id, ControlFault::NoRequest);
            return;
        };
        req.state = RequestState::Confirm;
        let (direction, value) = (req.direction, req.value);

        if self.timer.cancel() {
            warn!(
                "blinds {}: {}",
                self.config.id,
                ControlFault::UnexpectedTimer
            );
        }

        let command = PinCommand::single(self.pin_of(direction), value);
        debug!("blinds {}: send {command}", self.config.id);
        master.write(&command);
        self.timer
            .arm(TimerKind::Ack, clock.now_ms(), self.config.ack_timeout_ms);
    }

    fn confirm_request(&mut self, clock: &impl Clock) {
        let Some(req) = self.requests.current_mut() else {
            warn!("blinds {}: {}", self.config.id, ControlFault::NoRequest);
            return;
        };
        req.state = RequestState::Do;
        let hold = req.timeout_ms.unwrap_or(self.config.hold_timeout_ms);

        self.timer.cancel();
        self.timer.arm(TimerKind::Hold, clock.now_ms(), hold);
    }
}
