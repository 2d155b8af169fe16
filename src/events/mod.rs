//! Event plumbing for redirector.
//!
//! This module handles:
//! - The change-notification message contract
//! - Explicit listener subscription and FIFO event delivery

pub mod dispatcher;
pub mod message;

pub use dispatcher::{Dispatched, Dispatcher, Effect, Event, Listener};
pub use message::Message;
