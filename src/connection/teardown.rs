//! Best-effort session teardown

use crate::command::DispatcherHandle;
use crate::safety::EmergencyStop;
use crate::transport::SendOptions;
use std::time::Duration;
use tello_shared::{Command, LifecycleEvent, SessionLifecycle};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Teardown policy
#[derive(Debug, Clone, Copy)]
pub struct TeardownConfig {
    /// Pause between `land` and `streamoff`
    pub land_pause: Duration,
    pub send: SendOptions,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            land_pause: Duration::from_secs(1),
            send: SendOptions::default().quiet(),
        }
    }
}

/// Land, stop the stream, then drop every socket holder
///
/// The emergency handle is consumed here since it shares the session socket;
/// once this returns the local port is free. Every failure is swallowed, the
/// operator is leaving either way.
pub async fn shutdown(
    dispatcher: &DispatcherHandle,
    dispatcher_task: JoinHandle<()>,
    emergency: EmergencyStop,
    lifecycle: &mut SessionLifecycle,
    config: TeardownConfig,
) {
    info!("[SESSION] Shutting down...");
    lifecycle.process_event(LifecycleEvent::ShutdownRequested);

    if dispatcher.is_closed() {
        warn!("[SESSION] Dispatcher already stopped, skipping land and streamoff");
    } else {
        let land = dispatcher.submit_with(Command::Land, config.send).await;
        debug!("[SESSION] land during shutdown: {}", land.response_or("no response"));

        sleep(config.land_pause).await;

        let streamoff = dispatcher.submit_with(Command::StreamOff, config.send).await;
        debug!(
            "[SESSION] streamoff during shutdown: {}",
            streamoff.response_or("no response")
        );
    }

    drop(emergency);
    // Other handles may still be alive in spawned submitters
    dispatcher_task.abort();
    let _ = dispatcher_task.await;

    lifecycle.process_event(LifecycleEvent::Released);
    info!("[SESSION] Exited safely");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandDispatcher, DEFAULT_QUEUE_DEPTH};
    use crate::test_support::{free_local_addr, test_session_config, Responder};
    use crate::transport::Session;
    use std::sync::Arc;
    use tello_shared::SessionState;

    fn active_lifecycle() -> SessionLifecycle {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.process_event(LifecycleEvent::EstablishStarted);
        lifecycle.process_event(LifecycleEvent::Established);
        lifecycle
    }

    fn fast_teardown() -> TeardownConfig {
        TeardownConfig {
            land_pause: Duration::from_millis(20),
            send: SendOptions {
                timeout: Duration::from_millis(100),
                max_retries: 1,
                verbose: false,
            },
        }
    }

    #[tokio::test]
    async fn test_shutdown_lands_then_stops_stream() {
        let vehicle = Responder::spawn(|_, _| Some(b"ok".to_vec())).await;
        let session = Arc::new(Session::bind(&test_session_config(vehicle.addr())).unwrap());
        let emergency = session.emergency_stop();
        let (dispatcher, task) = CommandDispatcher::spawn(session, DEFAULT_QUEUE_DEPTH);
        let mut lifecycle = active_lifecycle();

        shutdown(&dispatcher, task, emergency, &mut lifecycle, fast_teardown()).await;

        assert_eq!(vehicle.received(), vec!["land", "streamoff"]);
        assert_eq!(lifecycle.state(), SessionState::Closed);
        assert!(dispatcher.is_closed());
    }

    #[tokio::test]
    async fn test_shutdown_ignores_silent_vehicle() {
        let vehicle = Responder::spawn(|_, _| None).await;
        let session = Arc::new(Session::bind(&test_session_config(vehicle.addr())).unwrap());
        let emergency = session.emergency_stop();
        let (dispatcher, task) = CommandDispatcher::spawn(session, DEFAULT_QUEUE_DEPTH);
        let mut lifecycle = active_lifecycle();

        shutdown(&dispatcher, task, emergency, &mut lifecycle, fast_teardown()).await;

        assert_eq!(vehicle.count(), 2);
        assert_eq!(lifecycle.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_port_free_once_closed() {
        let vehicle = Responder::spawn(|_, _| Some(b"ok".to_vec())).await;
        let mut config = test_session_config(vehicle.addr());
        config.local_addr = free_local_addr();
        let session = Arc::new(Session::bind(&config).unwrap());
        let emergency = session.emergency_stop();
        let (dispatcher, task) = CommandDispatcher::spawn(session, DEFAULT_QUEUE_DEPTH);
        let mut lifecycle = active_lifecycle();

        // Without address reuse this bind only succeeds once every holder is gone
        assert!(std::net::UdpSocket::bind(config.local_addr).is_err());

        shutdown(&dispatcher, task, emergency, &mut lifecycle, fast_teardown()).await;

        assert_eq!(lifecycle.state(), SessionState::Closed);
        assert!(std::net::UdpSocket::bind(config.local_addr).is_ok());
    }

    #[tokio::test]
    async fn test_stopped_dispatcher_skips_final_commands() {
        let vehicle = Responder::spawn(|_, _| Some(b"ok".to_vec())).await;
        let session = Arc::new(Session::bind(&test_session_config(vehicle.addr())).unwrap());
        let emergency = session.emergency_stop();
        let (dispatcher, task) = CommandDispatcher::spawn(session, DEFAULT_QUEUE_DEPTH);
        task.abort();
        let mut lifecycle = active_lifecycle();

        // Wait for the aborted loop to drop its receiver
        while !dispatcher.is_closed() {
            tokio::task::yield_now().await;
        }

        shutdown(&dispatcher, task, emergency, &mut lifecycle, fast_teardown()).await;

        assert_eq!(vehicle.count(), 0);
        assert_eq!(lifecycle.state(), SessionState::Closed);
    }
}
