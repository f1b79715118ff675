//! Remote-control client for a Tello quadcopter
//!
//! Establishes the UDP command session, serializes commands from every input
//! source onto it, and keeps an emergency stop path that bypasses the queue.

pub mod command;
pub mod connection;
pub mod error;
pub mod input;
pub mod safety;
pub mod transport;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::SessionError;
