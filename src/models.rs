use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The local user's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub public_key: String,
    pub display_name: String,
    pub avatar_path: String,
    pub created_at: i64,
}

/// A remote peer in the contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub public_key: String,
    pub display_name: String,
    pub avatar_path: String,
    pub is_online: bool,
    pub is_blocked: bool,
    pub last_seen: i64,
    pub added_at: i64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,   // Recorded locally, not yet handed off
    Sent,      // Accepted by the transport
    Delivered, // Reached the peer
    Read,      // Seen by the peer
    Failed,    // Transport error, never produced by the stub
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single chat message. `chat_id` is the contact's public ID since chats are 1:1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "chatID")]
    pub chat_id: String,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    pub content: String,
    pub timestamp: i64,
    pub status: MessageStatus,
}

/// Conversation preview shown in the sidebar. Derived on request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(rename = "contactID")]
    pub contact_id: String,
    pub contact: Contact,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}

impl ChatSummary {
    /// Timestamp the sidebar orders by: the last message if there is one,
    /// otherwise the moment the contact was added.
    pub fn activity_at(&self) -> i64 {
        self.last_message
            .as_ref()
            .map(|m| m.timestamp)
            .unwrap_or(self.contact.added_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        f.write_str(s)
    }
}

/// User-configurable preferences, replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub notifications_on: bool,
    pub sound_on: bool,
    pub show_message_preview: bool,
    pub sidebar_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::System,
            notifications_on: true,
            sound_on: true,
            show_message_preview: true,
            sidebar_width: 320,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnected,
}

/// Payload for contact presence changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStatusEvent {
    #[serde(rename = "contactID")]
    pub contact_id: String,
    pub is_online: bool,
    pub last_seen: i64,
}

/// Payload for message delivery status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatusEvent {
    #[serde(rename = "messageID")]
    pub message_id: String,
    #[serde(rename = "chatID")]
    pub chat_id: String,
    pub status: MessageStatus,
}
