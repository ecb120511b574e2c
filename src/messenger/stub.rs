// In-memory messenger backend
// Every public operation waits a randomized latency first (cancellable, and
// a cancelled wait means no mutation), then takes the store lock once.
// Background work is spawned on a TaskTracker so shutdown can join it.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::delay::sleep_or_cancel;
use super::store::{ChatState, Store, StoreStats};
use super::{
    delivery, presence, seed, ChatService, ContactManager, ContactStatusHandler, EventSubscriber,
    IdentityProvider, MessageStatusHandler, MessengerError, NewMessageHandler, Result,
    SettingsManager, StatusSimulator,
};
use crate::clock::{Clock, Jitter, SystemClock};
use crate::config::{DelayRange, SimulationConfig};
use crate::models::{ChatSummary, ConnectionState, Contact, Message, Settings, User};

/// Construction knobs for [`StubMessenger`].
pub struct StubOptions {
    pub config: SimulationConfig,
    pub clock: Arc<dyn Clock>,
    pub jitter: Jitter,
    /// Root shutdown signal. Pass the host's token to tie the backend to its lifecycle.
    pub shutdown: CancellationToken,
    /// Start with the demo profile, contacts and history.
    pub with_demo_data: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        StubOptions {
            config: SimulationConfig::default(),
            clock: Arc::new(SystemClock),
            jitter: Jitter::from_entropy(),
            shutdown: CancellationToken::new(),
            with_demo_data: true,
        }
    }
}

pub struct StubMessenger {
    store: Arc<Store>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
    presence_started: AtomicBool,
}

impl StubMessenger {
    /// A backend pre-populated with demo data and the default timings.
    pub fn new() -> Self {
        Self::with_options(StubOptions::default())
    }

    pub fn with_options(options: StubOptions) -> Self {
        let state: ChatState = if options.with_demo_data {
            seed::demo_state(options.clock.now_millis())
        } else {
            seed::empty_state()
        };
        let store = Store::new(state, options.clock, options.jitter, options.config);

        StubMessenger {
            store: Arc::new(store),
            shutdown: options.shutdown,
            tasks: TaskTracker::new(),
            presence_started: AtomicBool::new(false),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The stub has no transport, so it is always connected.
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    /// Current collection sizes, read straight from the store.
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Number of background tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    async fn latency(&self, range: impl Fn(&SimulationConfig) -> DelayRange) -> Result<()> {
        let wait = self.store.jitter.duration(range(&self.store.config));
        if sleep_or_cancel(&self.shutdown, wait).await {
            Ok(())
        } else {
            Err(MessengerError::Cancelled)
        }
    }
}

impl Default for StubMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for StubMessenger {
    async fn get_profile(&self) -> Result<User> {
        self.latency(|c| c.latency.get_profile).await?;
        Ok(self.store.profile().await)
    }

    async fn update_profile(&self, display_name: &str) -> Result<()> {
        self.latency(|c| c.latency.update_profile).await?;
        self.store.set_display_name(display_name).await;
        Ok(())
    }
}

#[async_trait]
impl ContactManager for StubMessenger {
    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.latency(|c| c.latency.list_contacts).await?;
        Ok(self.store.contacts().await)
    }

    async fn add_contact(&self, public_id: &str, display_name: &str) -> Result<Contact> {
        self.latency(|c| c.latency.add_contact).await?;
        let contact = self.store.add_contact(public_id, display_name).await?;
        info!("Added contact {}", public_id);
        Ok(contact)
    }

    async fn remove_contact(&self, contact_id: &str) -> Result<()> {
        self.latency(|c| c.latency.remove_contact).await?;
        self.store.remove_contact(contact_id).await?;
        info!("Removed contact {}", contact_id);
        Ok(())
    }

    async fn block_contact(&self, contact_id: &str) -> Result<()> {
        self.latency(|c| c.latency.block_contact).await?;
        self.store.set_blocked(contact_id, true).await
    }

    async fn unblock_contact(&self, contact_id: &str) -> Result<()> {
        self.latency(|c| c.latency.block_contact).await?;
        self.store.set_blocked(contact_id, false).await
    }
}

#[async_trait]
impl ChatService for StubMessenger {
    async fn list_chat_summaries(&self) -> Result<Vec<ChatSummary>> {
        self.latency(|c| c.latency.chat_summaries).await?;
        Ok(self.store.chat_summaries().await)
    }

    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message> {
        self.latency(|c| c.latency.send_message).await?;
        let msg = self.store.record_outgoing_message(contact_id, content).await?;

        self.tasks.spawn(delivery::simulate_delivery(
            self.store.clone(),
            self.shutdown.child_token(),
            msg.id.clone(),
            contact_id.to_string(),
        ));
        Ok(msg)
    }

    async fn get_messages(&self, contact_id: &str, limit: i32, before_id: &str) -> Result<Vec<Message>> {
        self.latency(|c| c.latency.get_messages).await?;
        self.store.messages(contact_id, limit, before_id).await
    }

    async fn mark_as_read(&self, contact_id: &str) -> Result<()> {
        self.latency(|c| c.latency.mark_as_read).await?;
        self.store.mark_as_read(contact_id).await
    }

    async fn clear_history(&self, contact_id: &str) -> Result<()> {
        self.latency(|c| c.latency.clear_history).await?;
        self.store.clear_history(contact_id).await
    }
}

#[async_trait]
impl SettingsManager for StubMessenger {
    async fn get_settings(&self) -> Result<Settings> {
        self.latency(|c| c.latency.get_settings).await?;
        Ok(self.store.settings().await)
    }

    async fn update_settings(&self, settings: Settings) -> Result<()> {
        self.latency(|c| c.latency.update_settings).await?;
        self.store.replace_settings(settings).await;
        Ok(())
    }
}

impl EventSubscriber for StubMessenger {
    fn on_new_message(&self, handler: NewMessageHandler) {
        self.store.events.set_new_message(handler);
    }

    fn on_contact_status_changed(&self, handler: ContactStatusHandler) {
        self.store.events.set_contact_status(handler);
    }

    fn on_message_status_changed(&self, handler: MessageStatusHandler) {
        self.store.events.set_message_status(handler);
    }
}

#[async_trait]
impl StatusSimulator for StubMessenger {
    fn start_status_simulation(&self) {
        if self.presence_started.swap(true, Ordering::SeqCst) {
            warn!("Presence simulation already running, ignoring start request");
            return;
        }
        self.tasks.spawn(presence::simulate_presence(
            self.store.clone(),
            self.shutdown.child_token(),
        ));
    }

    fn cancel(&self) {
        self.shutdown.cancel();
    }

    async fn wait(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        info!("All background tasks stopped");
    }
}
