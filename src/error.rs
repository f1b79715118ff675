//! Error taxonomy for the command session

use std::net::SocketAddr;

use tello_shared::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Socket binding on {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response to '{command}' after {attempts} attempt(s)")]
    Timeout { command: String, attempts: u32 },

    #[error("Undecodable response ({len} bytes)")]
    MalformedResponse { len: usize },

    #[error("Failed to establish connection after {attempts} attempt(s)")]
    EstablishmentFailed { attempts: u32 },

    #[error("Connection verification failed: {0}")]
    VerificationFailed(String),

    #[error("Command dispatcher is closed")]
    DispatcherClosed,

    #[error("Command queue is full")]
    DispatcherBusy,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// Whether the local port was already taken
    pub fn is_port_conflict(&self) -> bool {
        matches!(
            self,
            SessionError::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse
        )
    }
}
