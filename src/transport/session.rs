//! Transport session over the vehicle's UDP command port

use crate::error::SessionError;
use crate::safety::EmergencyStop;
use crate::transport::traits::{CommandChannel, SendOptions};
use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tello_shared::{limits, Command};
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info};

macro_rules! attempt_log {
    ($verbose:expr, $($arg:tt)*) => {
        if $verbose {
            info!($($arg)*);
        } else {
            debug!($($arg)*);
        }
    };
}

/// Configuration for the command session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local address to bind (the vehicle answers to this port)
    pub local_addr: SocketAddr,
    /// Vehicle command address
    pub vehicle_addr: SocketAddr,
    /// Pause between send attempts
    pub retry_backoff: Duration,
    /// Default per-command policy
    pub send: SendOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, limits::LOCAL_COMMAND_PORT)),
            vehicle_addr: SocketAddr::from((Ipv4Addr::new(192, 168, 10, 1), 8889)),
            retry_backoff: Duration::from_millis(limits::COMMAND_RETRY_BACKOFF_MS),
            send: SendOptions::default(),
        }
    }
}

/// A bound command socket paired with the vehicle address
///
/// The local and remote addresses are fixed for the life of the session.
pub struct Session {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    retry_backoff: Duration,
    defaults: SendOptions,
}

impl Session {
    /// Bind a fresh socket with address reuse enabled
    pub fn bind(config: &SessionConfig) -> Result<Self, SessionError> {
        let socket = bind_reusable(config.local_addr).map_err(|source| SessionError::Bind {
            addr: config.local_addr,
            source,
        })?;
        let local_addr = socket.local_addr()?;

        debug!("[SESSION] Bound {} -> {}", local_addr, config.vehicle_addr);

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            remote_addr: config.vehicle_addr,
            retry_backoff: config.retry_backoff,
            defaults: config.send,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Lock-free emergency path sharing this session's socket
    pub fn emergency_stop(&self) -> EmergencyStop {
        EmergencyStop::new(self.socket.clone(), self.remote_addr)
    }

    /// Send the SDK-mode handshake exactly once and wait for one reply
    ///
    /// Bypasses the retry loop; the establisher owns the retry policy.
    pub async fn handshake(&self, wait: Duration) -> Result<String, SessionError> {
        let command = Command::Enter;
        self.socket
            .send_to(&command.payload(), self.remote_addr)
            .await?;

        match self.recv_response(wait).await? {
            Some(bytes) => decode_response(&bytes),
            None => Err(SessionError::Timeout {
                command: command.to_string(),
                attempts: 1,
            }),
        }
    }

    /// Send raw bytes with the retry policy and return the trimmed response
    pub async fn send_payload(
        &self,
        payload: &[u8],
        label: &str,
        options: SendOptions,
    ) -> Result<String, SessionError> {
        let attempts = options.max_retries.max(1);

        attempt_log!(options.verbose, "[SESSION] Sending command: {}", label);

        for attempt in 1..=attempts {
            self.discard_stale();

            match self.attempt(payload, label, options.timeout).await {
                Ok(response) => {
                    attempt_log!(options.verbose, "[SESSION] Response: {}", response);
                    return Ok(response);
                }
                Err(e) => {
                    attempt_log!(
                        options.verbose,
                        "[SESSION] {} (attempt {}/{})",
                        e,
                        attempt,
                        attempts
                    );
                }
            }

            if attempt < attempts {
                sleep(self.retry_backoff).await;
            }
        }

        attempt_log!(
            options.verbose,
            "[SESSION] Failed to get response after {} attempts for command: {}",
            attempts,
            label
        );

        Err(SessionError::Timeout {
            command: label.to_string(),
            attempts,
        })
    }

    /// One send followed by one bounded wait
    async fn attempt(
        &self,
        payload: &[u8],
        label: &str,
        wait: Duration,
    ) -> Result<String, SessionError> {
        self.socket.send_to(payload, self.remote_addr).await?;

        match self.recv_response(wait).await? {
            Some(bytes) => decode_response(&bytes),
            None => Err(SessionError::Timeout {
                command: label.to_string(),
                attempts: 1,
            }),
        }
    }

    /// Wait for a datagram from the vehicle; others are skipped
    async fn recv_response(&self, wait: Duration) -> Result<Option<Vec<u8>>, SessionError> {
        let deadline = Instant::now() + wait;
        let mut buf = [0u8; limits::RESPONSE_BUFFER_LEN];

        loop {
            match timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                Err(_) => return Ok(None),
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok((n, from))) if from == self.remote_addr => {
                    return Ok(Some(buf[..n].to_vec()));
                }
                Ok(Ok((n, from))) => {
                    debug!("[SESSION] Ignoring {} bytes from {}", n, from);
                }
            }
        }
    }

    /// Drop late replies to earlier attempts so they are not misattributed
    fn discard_stale(&self) {
        let mut buf = [0u8; limits::RESPONSE_BUFFER_LEN];
        while let Ok((n, from)) = self.socket.try_recv_from(&mut buf) {
            debug!("[SESSION] Discarding stale {} bytes from {}", n, from);
        }
    }
}

#[async_trait]
impl CommandChannel for Session {
    async fn send_command(
        &self,
        command: &Command,
        options: SendOptions,
    ) -> Result<String, SessionError> {
        self.send_payload(&command.payload(), &command.redacted(), options)
            .await
    }

    fn default_options(&self) -> SendOptions {
        self.defaults
    }

    fn peer(&self) -> String {
        self.remote_addr.to_string()
    }
}

fn bind_reusable(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

fn decode_response(bytes: &[u8]) -> Result<String, SessionError> {
    std::str::from_utf8(bytes)
        .map(|text| text.trim().to_string())
        .map_err(|_| SessionError::MalformedResponse { len: bytes.len() })
}
