// Delivery simulation for outgoing messages
// Each sent message gets its own task: sending -> sent -> delivered, then
// maybe a canned reply from the contact. Cancellation during any wait ends
// the task before that stage's mutation; earlier stages stay applied.

use log::debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::delay::sleep_or_cancel;
use super::seed::AUTO_REPLIES;
use super::store::Store;
use crate::models::MessageStatus;

pub(crate) async fn simulate_delivery(
    store: Arc<Store>,
    token: CancellationToken,
    msg_id: String,
    contact_id: String,
) {
    let stages = [
        (store.config.sent_delay, MessageStatus::Sent),
        (store.config.delivered_delay, MessageStatus::Delivered),
    ];

    for (range, status) in stages {
        if !sleep_or_cancel(&token, store.jitter.duration(range)).await {
            debug!("Delivery of {} cancelled before {}", msg_id, status);
            return;
        }
        store.update_message_status(&msg_id, &contact_id, status).await;
    }

    if !sleep_or_cancel(&token, store.jitter.duration(store.config.reply_delay)).await {
        debug!("Auto-reply for {} cancelled", msg_id);
        return;
    }
    let reply = AUTO_REPLIES[store.jitter.index(AUTO_REPLIES.len())];
    if let Some(msg) = store.append_inbound_message(&contact_id, reply).await {
        debug!("{} auto-replied with {}", contact_id, msg.id);
    }
}
