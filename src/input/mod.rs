//! Operator input adapters
//!
//! Both adapters only produce commands; ordering and exclusivity on the wire
//! belong to the dispatcher.

mod controller;
mod interrupt;
mod keyboard;

pub use controller::{
    AxisRange, Button, ControllerAdapter, ControllerConfig, ControllerEvent, ControllerHandle,
    ControllerSource, ControllerState,
};
pub use interrupt::Interrupt;
pub use keyboard::{Intent, KeyboardInput, KEY_LEGEND};
