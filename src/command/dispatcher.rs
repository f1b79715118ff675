//! Command dispatcher - the single path from every input source to the wire
//!
//! The vehicle protocol has no request IDs, so only one command may be in
//! flight. Producers push requests into one ordered queue; one task pops
//! them and drives the channel's send/receive cycle to completion before
//! taking the next.

use crate::error::SessionError;
use crate::transport::{CommandChannel, SendOptions};
use std::sync::Arc;
use tello_shared::Command;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default queue depth for pending submissions
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Outcome of one dispatched command
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: Command,
    /// Trimmed response text; `None` when nothing usable came back
    pub response: Option<String>,
    /// Whether the expected token was observed
    pub success: bool,
    /// Why no response is available
    pub error: Option<String>,
}

impl CommandResult {
    fn answered(command: Command, response: String) -> Self {
        let success = command.is_affirmative(&response);
        Self {
            command,
            response: Some(response),
            success,
            error: None,
        }
    }

    fn failed(command: Command, error: impl Into<String>) -> Self {
        Self {
            command,
            response: None,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Response text or a placeholder for logs
    pub fn response_or(&self, fallback: &'static str) -> &str {
        self.response.as_deref().unwrap_or(fallback)
    }
}

/// A queued request awaiting its turn
struct DispatchRequest {
    command: Command,
    options: Option<SendOptions>,
    reply: oneshot::Sender<CommandResult>,
}

/// Reply slot for a request already admitted to the queue
pub struct PendingReply {
    command: Command,
    rx: oneshot::Receiver<CommandResult>,
}

impl PendingReply {
    /// Wait for the dispatcher to finish this command
    pub async fn wait(self) -> CommandResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => CommandResult::failed(self.command, SessionError::DispatcherClosed.to_string()),
        }
    }
}

/// Owns the serialized send loop
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Start the dispatch task over a command channel
    pub fn spawn(
        channel: Arc<dyn CommandChannel>,
        queue_depth: usize,
    ) -> (DispatcherHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel::<DispatchRequest>(queue_depth.max(1));
        let task = tokio::spawn(dispatch_loop(channel, rx));
        (DispatcherHandle { tx }, task)
    }
}

/// Cloneable submitter handle given to each input source
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<DispatchRequest>,
}

impl DispatcherHandle {
    /// Send a command with the channel's default policy and wait for it
    pub async fn submit(&self, command: Command) -> CommandResult {
        self.dispatch(command, None).await
    }

    /// Send a command with an explicit policy and wait for it
    pub async fn submit_with(&self, command: Command, options: SendOptions) -> CommandResult {
        self.dispatch(command, Some(options)).await
    }

    /// Wait only for queue admission; the reply can be awaited later
    pub async fn enqueue(
        &self,
        command: Command,
        options: Option<SendOptions>,
    ) -> Result<PendingReply, SessionError> {
        let (reply, rx) = oneshot::channel();
        let request = DispatchRequest {
            command: command.clone(),
            options,
            reply,
        };

        self.tx
            .send(request)
            .await
            .map_err(|_| SessionError::DispatcherClosed)?;

        Ok(PendingReply { command, rx })
    }

    /// Queue without waiting; fails at once when the queue is full
    ///
    /// For producers that must keep running while the vehicle is slow.
    pub fn try_enqueue(
        &self,
        command: Command,
        options: Option<SendOptions>,
    ) -> Result<PendingReply, SessionError> {
        let (reply, rx) = oneshot::channel();
        let request = DispatchRequest {
            command: command.clone(),
            options,
            reply,
        };

        self.tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::DispatcherBusy,
            TrySendError::Closed(_) => SessionError::DispatcherClosed,
        })?;

        Ok(PendingReply { command, rx })
    }

    /// Whether the dispatch task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn dispatch(&self, command: Command, options: Option<SendOptions>) -> CommandResult {
        match self.enqueue(command.clone(), options).await {
            Ok(pending) => pending.wait().await,
            Err(e) => {
                warn!("[DISPATCH] Dropping '{}': {}", command.redacted(), e);
                CommandResult::failed(command, e.to_string())
            }
        }
    }
}

/// Serve queued requests one at a time, in arrival order
async fn dispatch_loop(channel: Arc<dyn CommandChannel>, mut rx: mpsc::Receiver<DispatchRequest>) {
    info!("[DISPATCH] Serving commands for {}", channel.peer());
    let mut served: u64 = 0;

    while let Some(request) = rx.recv().await {
        let options = request
            .options
            .unwrap_or_else(|| channel.default_options());

        let result = match channel.send_command(&request.command, options).await {
            Ok(response) => CommandResult::answered(request.command, response),
            Err(e) => CommandResult::failed(request.command, e.to_string()),
        };
        served += 1;

        if let Err(result) = request.reply.send(result) {
            debug!(
                "[DISPATCH] Submitter left before '{}' completed",
                result.command.redacted()
            );
        }
    }

    info!("[DISPATCH] Queue closed after {} command(s)", served);
}
