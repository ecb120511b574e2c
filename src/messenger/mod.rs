// Messaging backend contract for Quillet
// The presentation layer depends only on the traits in this file. The
// in-memory StubMessenger is one implementation; a networked node would be
// another.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    ChatSummary, Contact, ContactStatusEvent, Message, MessageStatusEvent, Settings, User,
};

mod delay;
mod delivery;
pub mod events;
pub mod pagination;
mod presence;
mod seed;
mod store;
pub mod stub;

pub use events::EventDispatcher;
pub use store::StoreStats;
pub use stub::{StubMessenger, StubOptions};

/// Page size used when a caller asks for `limit <= 0`.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Errors returned by messenger operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("contact {0} not found")]
    ContactNotFound(String),

    #[error("contact {0} already exists")]
    ContactExists(String),

    #[error("message {0} not found")]
    MessageNotFound(String),

    /// The pre-mutation wait was interrupted by shutdown.
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MessengerError>;

pub type NewMessageHandler = Box<dyn Fn(Message) + Send + Sync>;
pub type ContactStatusHandler = Box<dyn Fn(ContactStatusEvent) + Send + Sync>;
pub type MessageStatusHandler = Box<dyn Fn(MessageStatusEvent) + Send + Sync>;

/// The local user's profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_profile(&self) -> Result<User>;
    async fn update_profile(&self, display_name: &str) -> Result<()>;
}

#[async_trait]
pub trait ContactManager: Send + Sync {
    /// All contacts, sorted by display name.
    async fn list_contacts(&self) -> Result<Vec<Contact>>;
    async fn add_contact(&self, public_id: &str, display_name: &str) -> Result<Contact>;
    /// Removes the contact together with its history and unread counter.
    async fn remove_contact(&self, contact_id: &str) -> Result<()>;
    async fn block_contact(&self, contact_id: &str) -> Result<()>;
    async fn unblock_contact(&self, contact_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// One summary per contact, most recent activity first.
    async fn list_chat_summaries(&self) -> Result<Vec<ChatSummary>>;
    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message>;
    /// Backward-paging history: up to `limit` messages strictly older than
    /// `before_id` (or the newest ones when `before_id` is empty), oldest first.
    async fn get_messages(&self, contact_id: &str, limit: i32, before_id: &str)
        -> Result<Vec<Message>>;
    async fn mark_as_read(&self, contact_id: &str) -> Result<()>;
    async fn clear_history(&self, contact_id: &str) -> Result<()>;
}

#[async_trait]
pub trait SettingsManager: Send + Sync {
    async fn get_settings(&self) -> Result<Settings>;
    async fn update_settings(&self, settings: Settings) -> Result<()>;
}

/// Callback registration. Each `on_*` call replaces the previous handler
/// for that event; there is exactly one slot per event kind.
pub trait EventSubscriber: Send + Sync {
    fn on_new_message(&self, handler: NewMessageHandler);
    fn on_contact_status_changed(&self, handler: ContactStatusHandler);
    fn on_message_status_changed(&self, handler: MessageStatusHandler);
}

/// Background simulation lifecycle.
#[async_trait]
pub trait StatusSimulator: Send + Sync {
    /// Start toggling contact presence. Only the first call has an effect.
    fn start_status_simulation(&self);
    /// Fire the shared cancellation signal.
    fn cancel(&self);
    /// Block until every background task has exited. Does not cancel by itself.
    async fn wait(&self);
    async fn shutdown(&self) {
        self.cancel();
        self.wait().await;
    }
}

/// The full messaging contract.
pub trait Messenger:
    IdentityProvider + ContactManager + ChatService + SettingsManager + EventSubscriber + StatusSimulator
{
}

impl<T> Messenger for T where
    T: IdentityProvider
        + ContactManager
        + ChatService
        + SettingsManager
        + EventSubscriber
        + StatusSimulator
{
}
