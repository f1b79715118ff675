//! Safety Module
//!
//! Emergency motor stop that bypasses the command dispatcher.

mod emergency;

pub use emergency::{EmergencyReport, EmergencyStop};
