//! Single-threaded mailbox carrying registry traffic back to pin owners.
//!
//! Every registration gets an [`InboxLink`] that tags messages with the
//! owner id; the service drains the [`Inbox`] after each operation and
//! routes messages to the owning consumer.  Draining happens outside the
//! registry call, so a consumer reacting to an update never re-enters the
//! registry mid-operation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::app::ports::PinLink;
use crate::error::RegistryError;
use crate::pins::PinIndex;
use crate::registry::RegisterResponse;
use crate::registry::pin::PinUpdate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxMessage {
    Opened {
        owner: String,
        response: RegisterResponse,
    },
    Failed {
        owner: String,
        index: PinIndex,
        error: RegistryError,
    },
    Update {
        owner: String,
        update: PinUpdate,
    },
    Closed {
        owner: String,
        index: PinIndex,
    },
}

/// Shared FIFO of [`InboxMessage`]s.  Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    queue: Rc<RefCell<VecDeque<InboxMessage>>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: InboxMessage) {
        self.queue.borrow_mut().push_back(message);
    }

    pub fn pop(&self) -> Option<InboxMessage> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn drain(&self) -> Vec<InboxMessage> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Create a link for one registration.
    pub fn link(&self, owner: &str, index: PinIndex) -> InboxLink {
        InboxLink {
            inbox: self.clone(),
            owner: owner.to_owned(),
            index,
        }
    }
}

/// [`PinLink`] that posts into an [`Inbox`].
pub struct InboxLink {
    inbox: Inbox,
    owner: String,
    index: PinIndex,
}

impl PinLink for InboxLink {
    fn open(&mut self, response: &RegisterResponse) {
        self.inbox.push(InboxMessage::Opened {
            owner: self.owner.clone(),
            response: response.clone(),
        });
    }

    fn error(&mut self, error: &RegistryError) {
        self.inbox.push(InboxMessage::Failed {
            owner: self.owner.clone(),
            index: self.index,
            error: error.clone(),
        });
    }

    fn update(&mut self, update: &PinUpdate) {
        self.inbox.push(InboxMessage::Update {
            owner: self.owner.clone(),
            update: *update,
        });
    }

    fn close(&mut self) {
        self.inbox.push(InboxMessage::Closed {
            owner: self.owner.clone(),
            index: self.index,
        });
    }
}
