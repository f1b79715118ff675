//! Session Lifecycle State Machine
//!
//! Defines the valid transitions of a command session:
//!
//! ```text
//! Unestablished -> Establishing -> Active -> ShuttingDown -> Closed
//!                   |  ^     |
//!                   +--+     +-> Failed
//! ```

/// States of a command session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket yet
    Unestablished,
    /// Handshake attempts in progress
    Establishing,
    /// Handshake accepted, commands may be issued
    Active,
    /// Landing and stream shutdown in progress
    ShuttingDown,
    /// Socket released
    Closed,
    /// Handshake never succeeded
    Failed,
}

/// Events that can trigger lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First handshake attempt starts
    EstablishStarted,
    /// A handshake attempt failed and another one follows
    AttemptFailed,
    /// Vehicle answered the handshake
    Established,
    /// All handshake attempts were used up
    AttemptsExhausted,
    /// Operator asked to exit
    ShutdownRequested,
    /// Final commands sent and socket dropped
    Released,
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed (or stayed, for retries)
    Success(SessionState),
    /// Transition was invalid from current state
    Invalid {
        from: SessionState,
        event: LifecycleEvent,
    },
}

/// Lifecycle of the single command session
#[derive(Debug)]
pub struct SessionLifecycle {
    current_state: SessionState,
    attempts: u32,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycle {
    /// Create a lifecycle in the Unestablished state
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Unestablished,
            attempts: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.current_state
    }

    /// Handshake attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self.current_state, SessionState::Closed | SessionState::Failed)
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        match self.next_state(event) {
            Some(state) => {
                if matches!(
                    event,
                    LifecycleEvent::EstablishStarted | LifecycleEvent::AttemptFailed
                ) {
                    self.attempts += 1;
                }
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn next_state(&self, event: LifecycleEvent) -> Option<SessionState> {
        use LifecycleEvent::*;
        use SessionState::*;

        match (self.current_state, event) {
            (Unestablished, EstablishStarted) => Some(Establishing),

            (Establishing, AttemptFailed) => Some(Establishing),
            (Establishing, Established) => Some(Active),
            (Establishing, AttemptsExhausted) => Some(Failed),

            (Active, ShutdownRequested) => Some(ShuttingDown),

            (ShuttingDown, Released) => Some(Closed),

            _ => None,
        }
    }
}
