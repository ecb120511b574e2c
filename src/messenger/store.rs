// Concurrent state store
// ChatState is the arena holding every piece of mutable chat state, keyed by
// contact ID. Store wraps it in a single readers-writer lock together with
// the collaborators the simulators need. Nothing else touches the maps.

use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::events::EventDispatcher;
use super::pagination;
use super::{MessengerError, Result};
use crate::clock::{Clock, Jitter};
use crate::config::SimulationConfig;
use crate::models::{
    ChatSummary, Contact, ContactStatusEvent, Message, MessageStatus, MessageStatusEvent,
    Settings, User,
};

/// Point-in-time counts for diagnostics. Taken without simulated latency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub contacts: usize,
    /// Log length per chat.
    pub messages: BTreeMap<String, usize>,
    pub unread: BTreeMap<String, u32>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChatState {
    pub profile: User,
    pub contacts: HashMap<String, Contact>,
    /// Per-chat logs in insertion (= chronological) order.
    pub chats: HashMap<String, Vec<Message>>,
    pub unread: HashMap<String, u32>,
    pub settings: Settings,
}

impl ChatState {
    pub fn new(profile: User, settings: Settings) -> Self {
        ChatState {
            profile,
            contacts: HashMap::new(),
            chats: HashMap::new(),
            unread: HashMap::new(),
            settings,
        }
    }

    fn contact_mut(&mut self, id: &str) -> Result<&mut Contact> {
        self.contacts
            .get_mut(id)
            .ok_or_else(|| MessengerError::ContactNotFound(id.to_string()))
    }

    fn ensure_contact(&self, id: &str) -> Result<()> {
        if self.contacts.contains_key(id) {
            Ok(())
        } else {
            Err(MessengerError::ContactNotFound(id.to_string()))
        }
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            contacts: self.contacts.len(),
            messages: self.chats.iter().map(|(id, log)| (id.clone(), log.len())).collect(),
            unread: self.unread.iter().map(|(id, n)| (id.clone(), *n)).collect(),
        }
    }

    pub fn sorted_contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.values().cloned().collect();
        contacts.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        contacts
    }

    pub fn add_contact(&mut self, public_id: &str, display_name: &str, now: i64) -> Result<Contact> {
        if self.contacts.contains_key(public_id) {
            return Err(MessengerError::ContactExists(public_id.to_string()));
        }

        let contact = Contact {
            public_id: public_id.to_string(),
            public_key: format!("{}-pub-key", public_id),
            display_name: display_name.to_string(),
            avatar_path: String::new(),
            is_online: false,
            is_blocked: false,
            last_seen: now,
            added_at: now,
        };
        self.contacts.insert(public_id.to_string(), contact.clone());
        self.chats.insert(public_id.to_string(), Vec::new());
        self.unread.insert(public_id.to_string(), 0);
        Ok(contact)
    }

    pub fn remove_contact(&mut self, id: &str) -> Result<()> {
        if self.contacts.remove(id).is_none() {
            return Err(MessengerError::ContactNotFound(id.to_string()));
        }
        self.chats.remove(id);
        self.unread.remove(id);
        Ok(())
    }

    pub fn set_blocked(&mut self, id: &str, blocked: bool) -> Result<()> {
        self.contact_mut(id)?.is_blocked = blocked;
        Ok(())
    }

    pub fn chat_summaries(&self) -> Vec<ChatSummary> {
        let mut summaries: Vec<ChatSummary> = self
            .contacts
            .iter()
            .map(|(id, contact)| ChatSummary {
                contact_id: id.clone(),
                contact: contact.clone(),
                last_message: self.chats.get(id).and_then(|log| log.last().cloned()),
                unread_count: self.unread.get(id).copied().unwrap_or(0),
            })
            .collect();
        pagination::sort_summaries(&mut summaries);
        summaries
    }

    pub fn messages(&self, contact_id: &str, limit: i32, before_id: &str) -> Result<Vec<Message>> {
        self.ensure_contact(contact_id)?;
        match self.chats.get(contact_id) {
            Some(log) => pagination::page(log, limit, before_id),
            None => pagination::page(&[], limit, before_id),
        }
    }

    pub fn mark_as_read(&mut self, contact_id: &str) -> Result<()> {
        self.ensure_contact(contact_id)?;
        self.unread.insert(contact_id.to_string(), 0);
        Ok(())
    }

    /// Drops the log only. The unread counter is left as it was.
    pub fn clear_history(&mut self, contact_id: &str) -> Result<()> {
        self.ensure_contact(contact_id)?;
        self.chats.insert(contact_id.to_string(), Vec::new());
        Ok(())
    }

    pub fn record_outgoing(
        &mut self,
        contact_id: &str,
        content: &str,
        id: String,
        now: i64,
    ) -> Result<Message> {
        self.ensure_contact(contact_id)?;
        let msg = Message {
            id,
            chat_id: contact_id.to_string(),
            sender_id: self.profile.public_id.clone(),
            content: content.to_string(),
            timestamp: now,
            status: MessageStatus::Sending,
        };
        self.chats
            .entry(contact_id.to_string())
            .or_default()
            .push(msg.clone());
        Ok(msg)
    }

    /// Returns `false` when the chat or the message is gone.
    pub fn set_message_status(&mut self, msg_id: &str, chat_id: &str, status: MessageStatus) -> bool {
        let found = self
            .chats
            .get_mut(chat_id)
            .and_then(|log| log.iter_mut().find(|m| m.id == msg_id));
        match found {
            Some(msg) => {
                msg.status = status;
                true
            }
            None => false,
        }
    }

    /// `None` when the contact is absent or blocked.
    pub fn append_inbound(
        &mut self,
        contact_id: &str,
        content: &str,
        id: String,
        now: i64,
    ) -> Option<Message> {
        match self.contacts.get(contact_id) {
            Some(c) if !c.is_blocked => {}
            _ => return None,
        }

        let msg = Message {
            id,
            chat_id: contact_id.to_string(),
            sender_id: contact_id.to_string(),
            content: content.to_string(),
            timestamp: now,
            status: MessageStatus::Delivered,
        };
        self.chats
            .entry(contact_id.to_string())
            .or_default()
            .push(msg.clone());
        *self.unread.entry(contact_id.to_string()).or_insert(0) += 1;
        Some(msg)
    }

    /// Flip the presence of the contact `pick` chooses among the non-blocked
    /// ones. Candidates are offered in ID order so a seeded pick is repeatable.
    /// Only going offline stamps `last_seen`; an online event reports the
    /// previous stamp rather than `now`.
    pub fn toggle_presence(
        &mut self,
        pick: impl FnOnce(usize) -> usize,
        now: i64,
    ) -> Option<ContactStatusEvent> {
        let mut candidates: Vec<&String> = self
            .contacts
            .iter()
            .filter(|(_, c)| !c.is_blocked)
            .map(|(id, _)| id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort();
        let target = candidates[pick(candidates.len())].clone();

        let contact = self.contacts.get_mut(&target)?;
        contact.is_online = !contact.is_online;
        if !contact.is_online {
            contact.last_seen = now;
        }
        Some(ContactStatusEvent {
            contact_id: target,
            is_online: contact.is_online,
            last_seen: contact.last_seen,
        })
    }
}

/// Shared handle used by the public operations and both simulators.
/// Timestamps are taken while holding the write guard, so a chat log's
/// insertion order is also its time order.
pub(crate) struct Store {
    state: RwLock<ChatState>,
    pub events: EventDispatcher,
    pub clock: Arc<dyn Clock>,
    pub jitter: Jitter,
    pub config: SimulationConfig,
}

impl Store {
    pub fn new(
        state: ChatState,
        clock: Arc<dyn Clock>,
        jitter: Jitter,
        config: SimulationConfig,
    ) -> Self {
        Store {
            state: RwLock::new(state),
            events: EventDispatcher::new(),
            clock,
            jitter,
            config,
        }
    }

    pub async fn stats(&self) -> StoreStats {
        self.state.read().await.stats()
    }

    pub async fn profile(&self) -> User {
        self.state.read().await.profile.clone()
    }

    pub async fn set_display_name(&self, name: &str) {
        self.state.write().await.profile.display_name = name.to_string();
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.state.read().await.sorted_contacts()
    }

    pub async fn add_contact(&self, public_id: &str, display_name: &str) -> Result<Contact> {
        let mut state = self.state.write().await;
        let now = self.clock.now_millis();
        state.add_contact(public_id, display_name, now)
    }

    pub async fn remove_contact(&self, id: &str) -> Result<()> {
        self.state.write().await.remove_contact(id)
    }

    pub async fn set_blocked(&self, id: &str, blocked: bool) -> Result<()> {
        self.state.write().await.set_blocked(id, blocked)
    }

    pub async fn chat_summaries(&self) -> Vec<ChatSummary> {
        self.state.read().await.chat_summaries()
    }

    pub async fn messages(&self, contact_id: &str, limit: i32, before_id: &str) -> Result<Vec<Message>> {
        self.state.read().await.messages(contact_id, limit, before_id)
    }

    pub async fn mark_as_read(&self, contact_id: &str) -> Result<()> {
        self.state.write().await.mark_as_read(contact_id)
    }

    pub async fn clear_history(&self, contact_id: &str) -> Result<()> {
        self.state.write().await.clear_history(contact_id)
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    pub async fn replace_settings(&self, settings: Settings) {
        self.state.write().await.settings = settings;
    }

    pub async fn record_outgoing_message(&self, contact_id: &str, content: &str) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state.write().await;
        let now = self.clock.now_millis();
        state.record_outgoing(contact_id, content, id, now)
    }

    /// Update a message's status and notify the status handler. A miss is a
    /// harmless race with clear/remove and is only logged.
    pub async fn update_message_status(&self, msg_id: &str, chat_id: &str, status: MessageStatus) {
        let found = self
            .state
            .write()
            .await
            .set_message_status(msg_id, chat_id, status);

        if !found {
            debug!("Status update to {} for vanished message {} in {}", status, msg_id, chat_id);
            return;
        }

        debug!("Message {} in {} is now {}", msg_id, chat_id, status);
        self.events.emit_message_status(MessageStatusEvent {
            message_id: msg_id.to_string(),
            chat_id: chat_id.to_string(),
            status,
        });
    }

    /// Append a message from the contact and notify the new-message handler.
    pub async fn append_inbound_message(&self, contact_id: &str, content: &str) -> Option<Message> {
        let id = Uuid::new_v4().to_string();
        let appended = {
            let mut state = self.state.write().await;
            let now = self.clock.now_millis();
            state.append_inbound(contact_id, content, id, now)
        };

        match &appended {
            Some(msg) => self.events.emit_new_message(msg.clone()),
            None => debug!("Inbound message for {} dropped: contact gone or blocked", contact_id),
        }
        appended
    }

    /// Flip a random non-blocked contact's presence and notify the handler.
    pub async fn toggle_random_presence(&self) -> Option<ContactStatusEvent> {
        let event = {
            let mut state = self.state.write().await;
            let now = self.clock.now_millis();
            state.toggle_presence(|len| self.jitter.index(len), now)
        };

        if let Some(ev) = &event {
            self.events.emit_contact_status(ev.clone());
        }
        event
    }
}
