//! Session establishment and teardown
//!
//! This module handles:
//! - SDK-mode handshake with per-attempt socket rebinding
//! - Post-handshake liveness and battery check
//! - Best-effort land and stream stop before the socket is released

mod establisher;
mod teardown;

pub use establisher::{EstablishConfig, Establisher, LinkReport};
pub use teardown::{shutdown, TeardownConfig};
