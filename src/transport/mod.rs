//! UDP command transport
//!
//! This module handles:
//! - Binding the fixed local command port with address reuse
//! - Send-and-await-response with per-attempt timeout and retry
//! - Handing the raw socket to the emergency stop path

mod session;
pub mod traits;

pub use session::{Session, SessionConfig};
pub use traits::{CommandChannel, SendOptions};
