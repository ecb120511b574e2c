// Presentation bridge
// Validates user input before it reaches the messenger and turns messenger
// callbacks into named events on a channel the shell drains.

use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::messenger::{
    ChatService, ContactManager, EventSubscriber, IdentityProvider, Messenger, MessengerError,
    SettingsManager, StatusSimulator,
};
use crate::models::{
    ChatSummary, Contact, ContactStatusEvent, Message, MessageStatusEvent, Settings, Theme, User,
};

pub const EVENT_APP_READY: &str = "app:ready";
pub const EVENT_MESSAGE_RECEIVED: &str = "message:received";
pub const EVENT_MESSAGE_STATUS: &str = "message:status";
pub const EVENT_CONTACT_STATUS: &str = "contact:status";

const EVENT_BUFFER: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("display name is empty")]
    EmptyDisplayName,

    #[error("message content is empty")]
    EmptyContent,

    #[error("public ID is empty")]
    EmptyPublicId,

    #[error("limit must not be negative")]
    InvalidLimit,

    #[error("invalid theme '{0}'")]
    InvalidTheme(String),

    #[error("sidebar width must be positive")]
    InvalidSidebarWidth,

    #[error(transparent)]
    Messenger(#[from] MessengerError),
}

/// An event forwarded to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum AppEvent {
    #[serde(rename = "app:ready")]
    Ready,
    #[serde(rename = "message:received")]
    MessageReceived(Message),
    #[serde(rename = "message:status")]
    MessageStatus(MessageStatusEvent),
    #[serde(rename = "contact:status")]
    ContactStatus(ContactStatusEvent),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Ready => EVENT_APP_READY,
            AppEvent::MessageReceived(_) => EVENT_MESSAGE_RECEIVED,
            AppEvent::MessageStatus(_) => EVENT_MESSAGE_STATUS,
            AppEvent::ContactStatus(_) => EVENT_CONTACT_STATUS,
        }
    }
}

fn forward(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = tx.try_send(event) {
        match e {
            mpsc::error::TrySendError::Full(ev) => {
                warn!("Event channel full, dropping {}", ev.name());
            }
            mpsc::error::TrySendError::Closed(_) => {
                // Receiver went away during shutdown.
            }
        }
    }
}

fn non_empty(value: &str, err: AppError) -> Result<&str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed)
    }
}

pub struct App {
    messenger: Arc<dyn Messenger>,
}

impl App {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        App { messenger }
    }

    /// Wire the messenger callbacks to a fresh event channel and optionally
    /// start the presence simulation. Must run inside a tokio runtime.
    pub fn startup(&self, simulate_presence: bool) -> mpsc::Receiver<AppEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let t = tx.clone();
        self.messenger
            .on_new_message(Box::new(move |msg| forward(&t, AppEvent::MessageReceived(msg))));
        let t = tx.clone();
        self.messenger
            .on_contact_status_changed(Box::new(move |ev| forward(&t, AppEvent::ContactStatus(ev))));
        let t = tx.clone();
        self.messenger
            .on_message_status_changed(Box::new(move |ev| forward(&t, AppEvent::MessageStatus(ev))));

        if simulate_presence {
            self.messenger.start_status_simulation();
        }

        forward(&tx, AppEvent::Ready);
        info!("Application started");
        rx
    }

    pub async fn shutdown(&self) {
        info!("Application shutting down");
        self.messenger.shutdown().await;
    }

    pub async fn get_identity(&self) -> Result<User, AppError> {
        Ok(self.messenger.get_profile().await?)
    }

    pub async fn update_profile(&self, display_name: &str) -> Result<(), AppError> {
        let name = non_empty(display_name, AppError::EmptyDisplayName)?;
        Ok(self.messenger.update_profile(name).await?)
    }

    pub async fn get_contacts(&self) -> Result<Vec<Contact>, AppError> {
        Ok(self.messenger.list_contacts().await?)
    }

    pub async fn add_contact(&self, public_id: &str, display_name: &str) -> Result<Contact, AppError> {
        let id = non_empty(public_id, AppError::EmptyPublicId)?;
        let name = non_empty(display_name, AppError::EmptyDisplayName)?;
        Ok(self.messenger.add_contact(id, name).await?)
    }

    pub async fn delete_contact(&self, contact_id: &str) -> Result<(), AppError> {
        Ok(self.messenger.remove_contact(contact_id).await?)
    }

    pub async fn block_contact(&self, contact_id: &str) -> Result<(), AppError> {
        Ok(self.messenger.block_contact(contact_id).await?)
    }

    pub async fn unblock_contact(&self, contact_id: &str) -> Result<(), AppError> {
        Ok(self.messenger.unblock_contact(contact_id).await?)
    }

    pub async fn get_chat_summaries(&self) -> Result<Vec<ChatSummary>, AppError> {
        Ok(self.messenger.list_chat_summaries().await?)
    }

    pub async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, AppError> {
        let content = non_empty(content, AppError::EmptyContent)?;
        Ok(self.messenger.send_message(contact_id, content).await?)
    }

    pub async fn get_messages(
        &self,
        contact_id: &str,
        limit: i32,
        before_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        if limit < 0 {
            return Err(AppError::InvalidLimit);
        }
        Ok(self.messenger.get_messages(contact_id, limit, before_id).await?)
    }

    pub async fn mark_as_read(&self, contact_id: &str) -> Result<(), AppError> {
        Ok(self.messenger.mark_as_read(contact_id).await?)
    }

    pub async fn clear_history(&self, contact_id: &str) -> Result<(), AppError> {
        Ok(self.messenger.clear_history(contact_id).await?)
    }

    pub async fn get_settings(&self) -> Result<Settings, AppError> {
        Ok(self.messenger.get_settings().await?)
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<(), AppError> {
        if settings.sidebar_width == 0 {
            return Err(AppError::InvalidSidebarWidth);
        }
        Ok(self.messenger.update_settings(settings).await?)
    }

    /// Switch the theme by name, keeping every other preference.
    pub async fn set_theme(&self, theme: &str) -> Result<Settings, AppError> {
        let theme: Theme = theme.trim().parse().map_err(AppError::InvalidTheme)?;
        let mut settings = self.messenger.get_settings().await?;
        settings.theme = theme;
        self.update_settings(settings.clone()).await?;
        Ok(settings)
    }
}
