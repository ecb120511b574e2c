// Presence simulation
// One long-lived task that flips a random non-blocked contact online or
// offline every presence_interval, until its token fires.

use log::{debug, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::delay::sleep_or_cancel;
use super::store::Store;

pub(crate) async fn simulate_presence(store: Arc<Store>, token: CancellationToken) {
    info!("Presence simulation started");

    loop {
        let wait = store.jitter.duration(store.config.presence_interval);
        if !sleep_or_cancel(&token, wait).await {
            break;
        }

        match store.toggle_random_presence().await {
            Some(ev) => debug!(
                "Presence toggle: {} is now {}",
                ev.contact_id,
                if ev.is_online { "online" } else { "offline" }
            ),
            None => debug!("Presence toggle skipped: no unblocked contacts"),
        }

        // A zero interval must still let other tasks run.
        tokio::task::yield_now().await;
    }

    info!("Presence simulation stopped");
}
