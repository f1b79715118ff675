//! Command submission for the remote-control client
//!
//! This module handles:
//! - Serializing commands from every input source onto one session
//! - Interpreting responses into command results
//! - Operator-level actions (status dump, WiFi change, flight commands)

mod dispatcher;
pub mod handlers;

pub use dispatcher::{
    CommandDispatcher, CommandResult, DispatcherHandle, PendingReply, DEFAULT_QUEUE_DEPTH,
};
