// Common test utilities for integration tests
// Fixtures and event collectors shared by every test file.

#![allow(dead_code)]

use log::LevelFilter;
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quillet::clock::{Jitter, ManualClock};
use quillet::config::{OperationLatency, SimulationConfig};
use quillet::messenger::{EventSubscriber, StubMessenger, StubOptions};
use quillet::models::{ContactStatusEvent, Message, MessageStatusEvent};

static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Documented stage and presence timings, but no per-operation latency.
pub fn stage_timings() -> SimulationConfig {
    SimulationConfig {
        latency: OperationLatency::instant(),
        ..SimulationConfig::default()
    }
}

/// Demo data, zero delays everywhere.
pub fn instant_messenger() -> StubMessenger {
    setup_logging();
    StubMessenger::with_options(StubOptions {
        config: SimulationConfig::instant(),
        jitter: Jitter::seeded(1),
        ..StubOptions::default()
    })
}

/// Demo data with the given timings.
pub fn demo_messenger(config: SimulationConfig) -> StubMessenger {
    setup_logging();
    StubMessenger::with_options(StubOptions {
        config,
        jitter: Jitter::seeded(7),
        ..StubOptions::default()
    })
}

/// Empty store driven by a manual clock.
pub fn fixture_messenger(clock: Arc<ManualClock>) -> StubMessenger {
    setup_logging();
    StubMessenger::with_options(StubOptions {
        config: SimulationConfig::instant(),
        clock,
        jitter: Jitter::seeded(3),
        shutdown: CancellationToken::new(),
        with_demo_data: false,
    })
}

/// Receivers for the three event kinds.
pub struct EventLog {
    pub new_messages: mpsc::UnboundedReceiver<Message>,
    pub message_status: mpsc::UnboundedReceiver<MessageStatusEvent>,
    pub contact_status: mpsc::UnboundedReceiver<ContactStatusEvent>,
}

/// Register channel-backed handlers for every event kind.
pub fn capture_events(messenger: &impl EventSubscriber) -> EventLog {
    let (msg_tx, new_messages) = mpsc::unbounded_channel();
    let (status_tx, message_status) = mpsc::unbounded_channel();
    let (presence_tx, contact_status) = mpsc::unbounded_channel();

    messenger.on_new_message(Box::new(move |m| {
        let _ = msg_tx.send(m);
    }));
    messenger.on_message_status_changed(Box::new(move |ev| {
        let _ = status_tx.send(ev);
    }));
    messenger.on_contact_status_changed(Box::new(move |ev| {
        let _ = presence_tx.send(ev);
    }));

    EventLog {
        new_messages,
        message_status,
        contact_status,
    }
}
