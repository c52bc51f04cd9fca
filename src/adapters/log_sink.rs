//! Log-based pin link decorator.
//!
//! Wraps another [`PinLink`] and writes the messages it carries to the
//! `log` facade before forwarding them.  Registration errors pass through
//! silently; the registry logs those.  The service wraps each owner's
//! inbox link in one, so pin traffic shows up on the console.

use log::{debug, info};

use crate::app::ports::PinLink;
use crate::error::RegistryError;
use crate::registry::RegisterResponse;
use crate::registry::pin::PinUpdate;

pub struct LogPinLink<L> {
    owner: String,
    inner: L,
}

impl<L: PinLink> LogPinLink<L> {
    pub fn new(owner: &str, inner: L) -> Self {
        Self {
            owner: owner.to_owned(),
            inner,
        }
    }
}

impl<L: PinLink> PinLink for LogPinLink<L> {
    fn open(&mut self, response: &RegisterResponse) {
        info!(
            "PIN  | {} opened pin {} caps={:?}",
            self.owner, response.index, response.caps
        );
        self.inner.open(response);
    }

    fn error(&mut self, error: &RegistryError) {
        self.inner.error(error);
    }

    fn update(&mut self, update: &PinUpdate) {
        debug!(
            "PIN  | {} pin {}={} at={}{}",
            self.owner,
            update.index,
            update.value,
            update.at,
            if update.registering { " (registering)" } else { "" }
        );
        self.inner.update(update);
    }

    fn close(&mut self) {
        info!("PIN  | {} closed", self.owner);
        self.inner.close();
    }
}
