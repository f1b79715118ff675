//! Flight command handler (takeoff, land, vertical moves)

use crate::command::{CommandResult, DispatcherHandle};
use tello_shared::Command;
use tracing::{info, warn};

/// Submit a flight command and log how the vehicle answered
pub async fn handle_flight_command(dispatcher: &DispatcherHandle, command: Command) -> CommandResult {
    let result = dispatcher.submit(command).await;
    report_flight_result(&result);
    result
}

/// Log a finished flight command
pub fn report_flight_result(result: &CommandResult) {
    let label = result.command.redacted();

    if result.success {
        info!("[FLIGHT] {} -> {}", label, result.response_or("ok"));
    } else if let Some(response) = &result.response {
        warn!("[FLIGHT] {} rejected: {}", label, response);
    } else {
        warn!(
            "[FLIGHT] {} failed: {}",
            label,
            result.error.as_deref().unwrap_or("no response")
        );
    }
}
