// Event dispatch for messenger callbacks
// One handler slot per event kind. Handlers are cloned out of their slot
// before being called, so a handler may re-register or call back into the
// messenger without deadlocking.

use log::debug;
use std::sync::{Arc, PoisonError, RwLock};

use super::{ContactStatusHandler, MessageStatusHandler, NewMessageHandler};
use crate::models::{ContactStatusEvent, Message, MessageStatusEvent};

type Slot<T> = RwLock<Option<Arc<T>>>;

#[derive(Default)]
pub struct EventDispatcher {
    new_message: Slot<dyn Fn(Message) + Send + Sync>,
    contact_status: Slot<dyn Fn(ContactStatusEvent) + Send + Sync>,
    message_status: Slot<dyn Fn(MessageStatusEvent) + Send + Sync>,
}

fn replace<T: ?Sized>(slot: &Slot<T>, handler: Arc<T>) {
    let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(handler);
}

fn current<T: ?Sized>(slot: &Slot<T>) -> Option<Arc<T>> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_new_message(&self, handler: NewMessageHandler) {
        replace(&self.new_message, Arc::from(handler));
    }

    pub fn set_contact_status(&self, handler: ContactStatusHandler) {
        replace(&self.contact_status, Arc::from(handler));
    }

    pub fn set_message_status(&self, handler: MessageStatusHandler) {
        replace(&self.message_status, Arc::from(handler));
    }

    pub fn emit_new_message(&self, message: Message) {
        match current(&self.new_message) {
            Some(handler) => handler(message),
            None => debug!("No new-message handler registered, dropping {}", message.id),
        }
    }

    pub fn emit_contact_status(&self, event: ContactStatusEvent) {
        if let Some(handler) = current(&self.contact_status) {
            handler(event);
        }
    }

    pub fn emit_message_status(&self, event: MessageStatusEvent) {
        if let Some(handler) = current(&self.message_status) {
            handler(event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("new_message", &current(&self.new_message).is_some())
            .field("contact_status", &current(&self.contact_status).is_some())
            .field("message_status", &current(&self.message_status).is_some())
            .finish()
    }
}
