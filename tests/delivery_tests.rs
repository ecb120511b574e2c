// Delivery simulation tests
// These run on paused tokio time, so the second-scale stage delays resolve
// instantly while elapsed virtual time stays measurable.

mod common;
use common::{capture_events, demo_messenger, stage_timings};

use std::time::Duration;
use tokio::time::Instant;

use quillet::messenger::{ChatService, ContactManager, StatusSimulator};
use quillet::models::MessageStatus;

/// Timer resolution slack for paused-clock measurements.
const SLACK: Duration = Duration::from_millis(5);

fn within(elapsed: Duration, min_ms: u64, max_ms: u64) -> bool {
    elapsed >= Duration::from_millis(min_ms) && elapsed <= Duration::from_millis(max_ms) + SLACK
}

#[tokio::test(start_paused = true)]
async fn test_status_progression_and_reply() {
    let s = demo_messenger(stage_timings());
    let mut events = capture_events(&s);

    let start = Instant::now();
    let msg = s.send_message("alice-id", "Hello Alice").await.unwrap();
    assert_eq!(msg.status, MessageStatus::Sending);

    let sent = events.message_status.recv().await.unwrap();
    assert_eq!(sent.message_id, msg.id);
    assert_eq!(sent.chat_id, "alice-id");
    assert_eq!(sent.status, MessageStatus::Sent);
    assert!(within(start.elapsed(), 150, 300), "sent after {:?}", start.elapsed());

    let delivered = events.message_status.recv().await.unwrap();
    assert_eq!(delivered.message_id, msg.id);
    assert_eq!(delivered.status, MessageStatus::Delivered);
    assert!(within(start.elapsed(), 550, 1000), "delivered after {:?}", start.elapsed());

    let reply = events.new_messages.recv().await.unwrap();
    assert_eq!(reply.chat_id, "alice-id");
    assert_eq!(reply.sender_id, "alice-id");
    assert_eq!(reply.status, MessageStatus::Delivered);
    assert!(!reply.content.is_empty());
    assert_ne!(reply.id, msg.id);
    assert!(within(start.elapsed(), 1550, 4000), "reply after {:?}", start.elapsed());

    s.wait().await;
    let history = s.get_messages("alice-id", 0, "").await.unwrap();
    let ids: Vec<&str> = history.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids[ids.len() - 2..], [msg.id.as_str(), reply.id.as_str()]);
    assert_eq!(history[history.len() - 2].status, MessageStatus::Delivered);

    let stats = s.stats().await;
    assert_eq!(stats.unread["alice-id"], 2);
    assert!(events.message_status.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_blocked_contact_never_replies() {
    let s = demo_messenger(stage_timings());
    let mut events = capture_events(&s);

    let msg = s.send_message("diana-id", "Are you there?").await.unwrap();
    s.wait().await;

    // The outgoing message still progresses, only the reply is suppressed.
    let statuses: Vec<MessageStatus> = [
        events.message_status.try_recv().unwrap(),
        events.message_status.try_recv().unwrap(),
    ]
    .into_iter()
    .map(|ev| {
        assert_eq!(ev.message_id, msg.id);
        ev.status
    })
    .collect();
    assert_eq!(statuses, vec![MessageStatus::Sent, MessageStatus::Delivered]);
    assert!(events.new_messages.try_recv().is_err());

    let stats = s.stats().await;
    assert_eq!(stats.messages["diana-id"], 1);
    assert_eq!(stats.unread["diana-id"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_flight_keeps_earlier_stage() {
    let s = demo_messenger(stage_timings());
    let mut events = capture_events(&s);

    let msg = s.send_message("alice-id", "Hello").await.unwrap();
    let sent = events.message_status.recv().await.unwrap();
    assert_eq!(sent.status, MessageStatus::Sent);

    s.shutdown().await;
    assert_eq!(s.active_tasks(), 0);

    assert!(events.message_status.try_recv().is_err());
    assert!(events.new_messages.try_recv().is_err());
    let stats = s.stats().await;
    assert_eq!(stats.messages["alice-id"], 6);
    assert_eq!(stats.unread["alice-id"], 1);
    assert!(!msg.id.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remove_contact_mid_flight() {
    let s = demo_messenger(stage_timings());
    let mut events = capture_events(&s);

    s.send_message("bob-id", "Hello Bob").await.unwrap();
    assert_eq!(
        events.message_status.recv().await.unwrap().status,
        MessageStatus::Sent
    );

    s.remove_contact("bob-id").await.unwrap();
    s.wait().await;

    assert!(events.message_status.try_recv().is_err());
    assert!(events.new_messages.try_recv().is_err());
    let stats = s.stats().await;
    assert!(!stats.messages.contains_key("bob-id"));
    assert!(!stats.unread.contains_key("bob-id"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_history_mid_flight() {
    let s = demo_messenger(stage_timings());
    let mut events = capture_events(&s);

    s.send_message("alice-id", "Hello").await.unwrap();
    assert_eq!(
        events.message_status.recv().await.unwrap().status,
        MessageStatus::Sent
    );

    s.clear_history("alice-id").await.unwrap();
    s.wait().await;

    // The delivered update finds nothing, but the contact still answers.
    assert!(events.message_status.try_recv().is_err());
    let reply = events.new_messages.try_recv().unwrap();
    assert_eq!(reply.sender_id, "alice-id");

    let history = s.get_messages("alice-id", 0, "").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, reply.id);
    assert_eq!(s.stats().await.unread["alice-id"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_joins_all_tasks() {
    let s = demo_messenger(stage_timings());
    let _events = capture_events(&s);

    for contact in ["alice-id", "bob-id", "charlie-id"] {
        s.send_message(contact, "ping").await.unwrap();
    }
    s.start_status_simulation();
    assert_eq!(s.active_tasks(), 4);

    s.shutdown().await;
    assert_eq!(s.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_handler_registered() {
    let s = demo_messenger(stage_timings());
    s.send_message("charlie-id", "anyone?").await.unwrap();
    s.wait().await;

    let history = s.get_messages("charlie-id", 0, "").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, MessageStatus::Delivered);
    assert_eq!(history[1].sender_id, "charlie-id");
}
