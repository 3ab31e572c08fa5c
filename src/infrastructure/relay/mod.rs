//! Messaging relay implementations

mod telegram;

pub use telegram::{TelegramRelay, TelegramRelayConfig};
