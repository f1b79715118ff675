//! Emergency stop path
//!
//! Writes `emergency` straight onto the session socket several times and
//! returns without waiting for any answer. It never touches the dispatcher
//! queue, so a command stuck in its retry loop cannot delay it.

use socket2::{SockAddr, SockRef};
use std::net::SocketAddr;
use std::sync::Arc;
use tello_shared::{limits, Command};
use tokio::net::UdpSocket;
use tracing::{error, warn};

/// Outcome of one emergency broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyReport {
    pub sent: usize,
    pub failed: usize,
}

impl EmergencyReport {
    /// At least one copy left the socket
    pub fn delivered_any(&self) -> bool {
        self.sent > 0
    }
}

/// Cloneable handle that can stop the motors from any task or thread
#[derive(Clone)]
pub struct EmergencyStop {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    repeat: usize,
}

impl EmergencyStop {
    pub fn new(socket: Arc<UdpSocket>, target: SocketAddr) -> Self {
        Self {
            socket,
            target,
            repeat: limits::EMERGENCY_REPEAT,
        }
    }

    /// Broadcast the stop command; never blocks and never fails the caller
    ///
    /// USE WITH EXTREME CAUTION - the vehicle drops out of the sky.
    pub fn trigger(&self) -> EmergencyReport {
        error!("[EMERGENCY] EMERGENCY STOP ACTIVATED");

        let payload = Command::Emergency.payload();
        let target = SockAddr::from(self.target);
        // Raw non-blocking sendto; does not wait on reactor readiness
        let socket = SockRef::from(self.socket.as_ref());

        let mut report = EmergencyReport { sent: 0, failed: 0 };
        for copy in 1..=self.repeat {
            match socket.send_to(&payload, &target) {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "[EMERGENCY] Error sending emergency stop ({}/{}): {}",
                        copy, self.repeat, e
                    );
                }
            }
        }

        if report.delivered_any() {
            warn!(
                "[EMERGENCY] Emergency stop command sent ({}/{} copies)",
                report.sent, self.repeat
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandDispatcher;
    use crate::test_support::{test_session_config, Responder};
    use crate::transport::Session;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_sends_three_copies_without_waiting() {
        let vehicle = Responder::spawn(|_, _| None).await;
        let session = Session::bind(&test_session_config(vehicle.addr())).unwrap();
        let stop = session.emergency_stop();

        let started = Instant::now();
        let report = stop.trigger();
        assert!(started.elapsed() < Duration::from_millis(50));
        assert_eq!(report, EmergencyReport { sent: 3, failed: 0 });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(vehicle.received(), vec!["emergency"; 3]);
    }

    #[tokio::test]
    async fn test_socket_error_is_reported_not_raised() {
        // IPv6 destination on an IPv4 socket
        let session = Session::bind(&test_session_config("[::1]:9".parse().unwrap())).unwrap();

        let report = session.emergency_stop().trigger();
        assert_eq!(report.sent + report.failed, 3);
        assert!(report.failed > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_not_delayed_by_command_in_flight() {
        // Silent vehicle keeps the dispatcher busy retrying takeoff
        let vehicle = Responder::spawn(|_, _| None).await;
        let session = Arc::new(Session::bind(&test_session_config(vehicle.addr())).unwrap());
        let stop = session.emergency_stop();
        let (dispatcher, _task) = CommandDispatcher::spawn(session, 8);

        let in_flight = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit(Command::Takeoff).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = stop.trigger();
        assert!(report.delivered_any());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!in_flight.is_finished());
        assert!(vehicle.received().contains(&"emergency".to_string()));

        let result = in_flight.await.unwrap();
        assert!(!result.success);
    }
}
