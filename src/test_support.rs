//! Loopback stand-ins for the vehicle

use crate::transport::{SendOptions, SessionConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

type Log = Arc<Mutex<Vec<(Instant, String)>>>;

/// Simulated vehicle answering on a loopback UDP port
///
/// The policy sees each packet's text and its 1-based arrival number and
/// returns the bytes to answer with, if any.
pub(crate) struct Responder {
    addr: SocketAddr,
    log: Log,
    task: JoinHandle<()>,
}

impl Responder {
    pub(crate) async fn spawn<F>(policy: F) -> Self
    where
        F: Fn(&str, usize) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let log: Log = Arc::new(Mutex::new(Vec::new()));

        let task_log = log.clone();
        let task = tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            loop {
                let Ok((n, from)) = socket.recv_from(&mut buf).await else {
                    continue;
                };
                let text = String::from_utf8_lossy(&buf[..n]).to_string();
                let count = {
                    let mut log = task_log.lock().unwrap();
                    log.push((Instant::now(), text.clone()));
                    log.len()
                };
                if let Some(reply) = policy(&text, count) {
                    let _ = socket.send_to(&reply, from).await;
                }
            }
        });

        Self { addr, log, task }
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Texts received so far, in arrival order
    pub(crate) fn received(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Arrival instants so far
    pub(crate) fn arrivals(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session settings scaled down for tests, bound to an ephemeral port
pub(crate) fn test_session_config(vehicle: SocketAddr) -> SessionConfig {
    SessionConfig {
        local_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        vehicle_addr: vehicle,
        retry_backoff: Duration::from_millis(100),
        send: SendOptions {
            timeout: Duration::from_millis(150),
            max_retries: 3,
            verbose: false,
        },
    }
}

/// A loopback port that was free a moment ago
pub(crate) fn free_local_addr() -> SocketAddr {
    let placeholder = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    placeholder.local_addr().unwrap()
}
