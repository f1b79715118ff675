//! WiFi reconfiguration handler

use crate::command::DispatcherHandle;
use crate::error::SessionError;
use tello_shared::Command;
use tracing::{info, warn};

/// Change the vehicle's access point credentials
///
/// On success the vehicle drops the current link and restarts its network;
/// the session is unusable afterwards until the operator reconnects.
pub async fn handle_wifi_update(
    dispatcher: &DispatcherHandle,
    ssid: &str,
    password: &str,
) -> Result<bool, SessionError> {
    let command = Command::wifi(ssid, password)?;

    warn!("[WIFI] This will change the drone's WiFi settings and disconnect the current connection!");

    let result = dispatcher.submit(command).await;
    if result.success {
        info!("[WIFI] WiFi settings changed successfully");
        info!("[WIFI] The drone will disconnect and connect to the new network");
        info!("[WIFI] New network: {}", ssid);
    } else {
        warn!(
            "[WIFI] Failed to change WiFi settings. Response: {}",
            result.response_or("No response")
        );
    }

    Ok(result.success)
}
