//! Connection establisher - SDK-mode handshake and link verification

use crate::command::DispatcherHandle;
use crate::error::SessionError;
use crate::transport::{Session, SessionConfig};
use std::time::Duration;
use tello_shared::{limits, Command, LifecycleEvent, Response, SessionLifecycle};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Configuration for establishing the session
#[derive(Debug, Clone)]
pub struct EstablishConfig {
    /// Handshake attempts, each on a freshly bound socket
    pub max_attempts: u32,
    /// Wait for the handshake reply
    pub handshake_timeout: Duration,
    /// Pause between attempts
    pub attempt_delay: Duration,
    /// Battery percentage below which a warning is raised
    pub low_battery_percent: u32,
}

impl Default for EstablishConfig {
    fn default() -> Self {
        Self {
            max_attempts: limits::ESTABLISH_MAX_ATTEMPTS,
            handshake_timeout: Duration::from_millis(limits::HANDSHAKE_TIMEOUT_MS),
            attempt_delay: Duration::from_millis(limits::ESTABLISH_RETRY_DELAY_MS),
            low_battery_percent: limits::BATTERY_LOW_PERCENT,
        }
    }
}

/// Result of the post-handshake liveness round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkReport {
    /// Battery percentage, when the vehicle reported a plain integer
    pub battery_percent: Option<u32>,
    pub battery_low: bool,
}

/// Brings the vehicle into command mode
pub struct Establisher {
    session: SessionConfig,
    config: EstablishConfig,
}

impl Establisher {
    pub fn new(session: SessionConfig, config: EstablishConfig) -> Self {
        Self { session, config }
    }

    /// Bind, handshake and retry until the vehicle accepts or attempts run out
    pub async fn connect(&self, lifecycle: &mut SessionLifecycle) -> Result<Session, SessionError> {
        let max_attempts = self.config.max_attempts.max(1);
        let port = self.session.local_addr.port();

        info!("[CONNECT] Establishing connection with Tello drone...");

        for attempt in 1..=max_attempts {
            lifecycle.process_event(if attempt == 1 {
                LifecycleEvent::EstablishStarted
            } else {
                LifecycleEvent::AttemptFailed
            });
            info!("[CONNECT] Attempt {}/{} to connect", attempt, max_attempts);

            let session = match Session::bind(&self.session) {
                Ok(session) => {
                    info!("[CONNECT] Socket binding successful");
                    session
                }
                Err(e) => {
                    error!("[CONNECT] {}", e);
                    if e.is_port_conflict() {
                        warn!("[CONNECT] Port {} might be in use by another application", port);
                    }
                    if attempt == max_attempts {
                        break;
                    }
                    sleep(self.config.attempt_delay).await;
                    continue;
                }
            };

            info!("[CONNECT] Sending command to enter SDK mode...");
            match session.handshake(self.config.handshake_timeout).await {
                Ok(response) if Command::Enter.is_affirmative(&response) => {
                    info!("[CONNECT] Successfully entered SDK mode");
                    lifecycle.process_event(LifecycleEvent::Established);
                    return Ok(session);
                }
                Ok(response) => {
                    warn!("[CONNECT] Unexpected response to SDK mode: {}", response);
                }
                Err(SessionError::Timeout { .. }) => {
                    warn!("[CONNECT] Timeout while waiting for SDK mode response");
                    warn!("[CONNECT] Is the drone powered on? Are you connected to Tello WiFi?");
                }
                Err(e) => {
                    warn!("[CONNECT] Error during connection: {}", e);
                }
            }

            // Release the port before the next bind
            drop(session);
            if attempt < max_attempts {
                sleep(self.config.attempt_delay).await;
            }
        }

        lifecycle.process_event(LifecycleEvent::AttemptsExhausted);
        error!("[CONNECT] Failed to establish connection after multiple attempts");
        info!("[CONNECT] Troubleshooting tips:");
        info!("[CONNECT]   1. Make sure the drone is powered on");
        info!("[CONNECT]   2. Connect to the Tello WiFi network (usually starts with 'TELLO-')");
        info!("[CONNECT]   3. Check if any other application is using port {}", port);
        info!("[CONNECT]   4. Try restarting the drone");

        Err(SessionError::EstablishmentFailed {
            attempts: max_attempts,
        })
    }

    /// Liveness round through the normal send path, then a battery check
    ///
    /// Failure is reported to the caller; establishment is not retried here.
    pub async fn verify(&self, dispatcher: &DispatcherHandle) -> Result<LinkReport, SessionError> {
        info!("[CONNECT] Checking connection to Tello...");

        let check = dispatcher.submit(Command::Enter).await;
        if !check.success {
            error!("[CONNECT] Connection failed! Make sure you're connected to Tello's WiFi network");
            info!("[CONNECT] Tello WiFi name usually starts with 'TELLO-'");
            let reason = check
                .response
                .or(check.error)
                .unwrap_or_else(|| "no response".into());
            return Err(SessionError::VerificationFailed(reason));
        }
        info!("[CONNECT] Connection verified!");

        let battery = dispatcher.submit(Command::Battery).await;
        let battery_percent = match battery.response.as_deref().map(Response::parse) {
            Some(Response::Value(value)) => u32::try_from(value).ok(),
            _ => None,
        };

        let battery_low = battery_percent.is_some_and(|p| p < self.config.low_battery_percent);
        match battery_percent {
            Some(percent) => {
                info!("[CONNECT] Battery level: {}%", percent);
                if battery_low {
                    warn!("[CONNECT] Warning: Battery level low!");
                }
            }
            None => warn!(
                "[CONNECT] Battery level unavailable: {}",
                battery.response_or("no response")
            ),
        }

        Ok(LinkReport {
            battery_percent,
            battery_low,
        })
    }
}
