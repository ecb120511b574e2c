// Quillet messaging core
pub mod app;
pub mod clock;
pub mod config;
pub mod messenger;
pub mod models;

// Re-export main types for convenience
pub use messenger::{Messenger, MessengerError, StubMessenger, StubOptions};
pub use models::*;
