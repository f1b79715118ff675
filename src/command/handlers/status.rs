//! Status dump handler

use crate::command::DispatcherHandle;
use tello_shared::{limits, Command, TelemetryStatus};
use tracing::{info, warn};

/// Request `status?` and log every reported field
///
/// Returns `None` when the vehicle gave no usable answer.
pub async fn handle_status_request(dispatcher: &DispatcherHandle) -> Option<TelemetryStatus> {
    info!("[STATUS] Requesting vehicle status...");

    let result = dispatcher.submit(Command::Status).await;
    let raw = match result.response {
        Some(raw) if result.success => raw,
        _ => {
            warn!("[STATUS] Failed to get status information");
            return None;
        }
    };

    let status = TelemetryStatus::parse(&raw);
    if status.is_empty() {
        warn!("[STATUS] Could not parse status, raw: {}", raw);
        return Some(status);
    }

    info!("[STATUS] {}", "=".repeat(40));
    for field in status.fields() {
        info!("[STATUS]   {}: {}", field.key, field.value);
    }
    info!("[STATUS] {}", "=".repeat(40));

    if let Some(percent) = status.battery_percent() {
        if percent < i64::from(limits::BATTERY_LOW_PERCENT) {
            warn!("[STATUS] Warning: Battery level low ({}%)", percent);
        }
    }

    Some(status)
}
