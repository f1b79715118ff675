//! Command channel abstraction between the dispatcher and the wire

use crate::error::SessionError;
use async_trait::async_trait;
use std::time::Duration;
use tello_shared::{limits, Command};

/// Per-command send policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// How long to wait for a response on each attempt
    pub timeout: Duration,
    /// Total send attempts (at least one is always made)
    pub max_retries: u32,
    /// Log every attempt at info level instead of debug
    pub verbose: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(limits::COMMAND_TIMEOUT_MS),
            max_retries: limits::COMMAND_MAX_RETRIES,
            verbose: true,
        }
    }
}

impl SendOptions {
    /// Same policy without per-attempt chatter
    pub fn quiet(self) -> Self {
        Self {
            verbose: false,
            ..self
        }
    }
}

/// Something that can carry one command and return its response text
///
/// Implementations are not required to serialize callers; the dispatcher does.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Send a command and wait for its trimmed response
    async fn send_command(
        &self,
        command: &Command,
        options: SendOptions,
    ) -> Result<String, SessionError>;

    /// Policy used when a submitter does not pick one
    fn default_options(&self) -> SendOptions {
        SendOptions::default()
    }

    /// Human-readable description of the peer
    fn peer(&self) -> String;
}
