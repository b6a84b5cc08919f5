//! API module for all HTTP handlers

pub mod health;
pub mod webhook;

pub use health::root;
pub use webhook::{handle_webhook, method_not_allowed};
