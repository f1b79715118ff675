//! Tello Shared Protocol Types
//!
//! This crate provides the text command protocol, status parsing and the
//! session lifecycle state machine used by the remote-control client.

pub mod command;
pub mod state_machine;
pub mod status;

pub use command::{Command, ProtocolError, Response};
pub use state_machine::{LifecycleEvent, SessionLifecycle, SessionState, TransitionResult};
pub use status::{StatusField, TelemetryStatus};

/// Protocol and timing parameters for the command channel
pub mod limits {
    /// Address of the vehicle's command port on its own access point
    pub const VEHICLE_COMMAND_ADDR: &str = "192.168.10.1:8889";

    /// Local UDP port the vehicle replies to
    pub const LOCAL_COMMAND_PORT: u16 = 8889;

    /// Address the vehicle streams raw video to
    pub const VIDEO_STREAM_ADDR: &str = "0.0.0.0:11111";

    /// Per-attempt response timeout in milliseconds
    pub const COMMAND_TIMEOUT_MS: u64 = 5000;

    /// Send attempts per command before reporting a timeout
    pub const COMMAND_MAX_RETRIES: u32 = 3;

    /// Pause between send attempts in milliseconds
    pub const COMMAND_RETRY_BACKOFF_MS: u64 = 1000;

    /// Handshake attempts before establishment is abandoned
    pub const ESTABLISH_MAX_ATTEMPTS: u32 = 3;

    /// Handshake response timeout in milliseconds
    pub const HANDSHAKE_TIMEOUT_MS: u64 = 5000;

    /// Pause between handshake attempts in milliseconds
    pub const ESTABLISH_RETRY_DELAY_MS: u64 = 2000;

    /// Battery percentage below which the operator is warned
    pub const BATTERY_LOW_PERCENT: u32 = 20;

    /// Redundant sends of the emergency command
    pub const EMERGENCY_REPEAT: usize = 3;

    /// Minimum interval between analog movement commands in milliseconds
    pub const CONTROLLER_RATE_LIMIT_MS: u64 = 500;

    /// Axis deflection (percent) treated as neutral
    pub const AXIS_DEADZONE_PERCENT: f32 = 15.0;

    /// Vertical step issued for a deflected axis, in centimetres
    pub const AXIS_STEP_CM: u32 = 30;

    /// Smallest distance accepted by `up`/`down`
    pub const MIN_MOVE_CM: u32 = 20;

    /// Largest distance accepted by `up`/`down`
    pub const MAX_MOVE_CM: u32 = 500;

    /// Largest datagram read from the command port
    pub const RESPONSE_BUFFER_LEN: usize = 1024;
}
