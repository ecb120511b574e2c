// Demo data the stub backend starts with.

use chrono::{Duration, TimeZone, Utc};

use super::store::ChatState;
use crate::models::{Contact, Message, MessageStatus, Settings, User};

pub(crate) const MY_PUBLIC_ID: &str = "me-public-id-0000";

/// Canned responses used for auto-replies.
pub(crate) const AUTO_REPLIES: [&str; 8] = [
    "Got it, thanks!",
    "Interesting, tell me more.",
    "Let me think about that.",
    "Sure thing!",
    "Sounds good to me.",
    "I'll get back to you on that.",
    "Absolutely!",
    "Hmm, I'm not sure about that.",
];

pub(crate) fn default_profile() -> User {
    User {
        public_id: MY_PUBLIC_ID.to_string(),
        public_key: "me-public-key-0000".to_string(),
        display_name: "Me".to_string(),
        avatar_path: String::new(),
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .map(|t| t.timestamp_millis())
            .unwrap_or_default(),
    }
}

/// Profile and settings only, no contacts.
pub(crate) fn empty_state() -> ChatState {
    ChatState::new(default_profile(), Settings::default())
}

fn ago(now: i64, d: Duration) -> i64 {
    now - d.num_milliseconds()
}

fn contact(id: &str, name: &str, online: bool, blocked: bool, last_seen: i64, added_at: i64) -> Contact {
    Contact {
        public_id: id.to_string(),
        public_key: format!("{}-pub-key", id.trim_end_matches("-id")),
        display_name: name.to_string(),
        avatar_path: String::new(),
        is_online: online,
        is_blocked: blocked,
        last_seen,
        added_at,
    }
}

fn message(id: &str, chat: &str, sender: &str, content: &str, timestamp: i64, status: MessageStatus) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat.to_string(),
        sender_id: sender.to_string(),
        content: content.to_string(),
        timestamp,
        status,
    }
}

/// The populated demo state, with timestamps relative to `now`.
pub(crate) fn demo_state(now: i64) -> ChatState {
    let mut state = empty_state();
    let me = MY_PUBLIC_ID;
    let h = Duration::hours;
    let m = Duration::minutes;
    let days = Duration::days;

    for c in [
        contact("alice-id", "Alice", true, false, now, ago(now, days(30))),
        contact("bob-id", "Bob", false, false, ago(now, h(2)), ago(now, days(20))),
        contact("charlie-id", "Charlie", true, false, now, ago(now, days(10))),
        contact("diana-id", "Diana", false, true, ago(now, days(7)), ago(now, days(5))),
    ] {
        state.chats.insert(c.public_id.clone(), Vec::new());
        state.unread.insert(c.public_id.clone(), 0);
        state.contacts.insert(c.public_id.clone(), c);
    }

    use MessageStatus::{Delivered, Read};
    let alice = vec![
        message("msg-a1", "alice-id", me, "Hey Alice!", ago(now, h(2)), Read),
        message("msg-a2", "alice-id", "alice-id", "Hi! How are you?", ago(now, h(1) + m(55)), Read),
        message("msg-a3", "alice-id", me, "Doing great, thanks! Working on Quillet.", ago(now, h(1) + m(50)), Read),
        message("msg-a4", "alice-id", "alice-id", "Sounds exciting! Tell me more.", ago(now, h(1) + m(45)), Read),
        message("msg-a5", "alice-id", me, "It's a p2p messenger with e2e encryption.", ago(now, h(1) + m(40)), Delivered),
    ];
    let bob = vec![
        message("msg-b1", "bob-id", "bob-id", "Hey, are you free this weekend?", ago(now, h(5)), Read),
        message("msg-b2", "bob-id", me, "Let me check my schedule.", ago(now, h(4) + m(30)), Read),
        message("msg-b3", "bob-id", "bob-id", "Sure, no rush!", ago(now, h(4)), Read),
        message("msg-b4", "bob-id", me, "I'm free on Saturday afternoon.", ago(now, h(3)), Delivered),
        message("msg-b5", "bob-id", "bob-id", "Perfect, let's grab coffee then.", ago(now, h(2) + m(30)), Read),
    ];
    state.chats.insert("alice-id".to_string(), alice);
    state.chats.insert("bob-id".to_string(), bob);
    state.unread.insert("alice-id".to_string(), 1);
    state.unread.insert("bob-id".to_string(), 2);

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_state_is_consistent() {
        let state = demo_state(1_750_000_000_000);
        assert_eq!(state.contacts.len(), 4);
        assert!(state.contacts["diana-id"].is_blocked);
        assert_eq!(state.contacts["alice-id"].public_key, "alice-pub-key");
        for (chat_id, log) in &state.chats {
            assert!(state.contacts.contains_key(chat_id));
            assert!(log.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            assert!(log.iter().all(|m| &m.chat_id == chat_id));
        }
        assert_eq!(state.unread["bob-id"], 2);
    }

    #[test]
    fn test_profile_created_at() {
        assert_eq!(default_profile().created_at, 1_735_689_600_000);
    }
}
