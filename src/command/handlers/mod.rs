//! Operator actions built on the dispatcher

mod flight;
mod status;
mod wifi;

pub use flight::{handle_flight_command, report_flight_result};
pub use status::handle_status_request;
pub use wifi::handle_wifi_update;
