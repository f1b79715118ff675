//! Text command protocol
//!
//! Every command is a single ASCII datagram. The vehicle answers with at most
//! one datagram:
//! ```text
//! command   -> ok
//! battery?  -> 87
//! up 30     -> ok | error ...
//! emergency -> (not awaited)
//! ```
//!
//! There are no request identifiers, so a response can only be attributed to
//! the one command currently in flight.

use std::fmt;

use thiserror::Error;

use crate::limits;

/// Errors raised while building commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Distance {0} cm out of range ({min}-{max} cm)", min = limits::MIN_MOVE_CM, max = limits::MAX_MOVE_CM)]
    DistanceOutOfRange(u32),

    #[error("WiFi {0} cannot be empty")]
    EmptyCredential(&'static str),

    #[error("WiFi {0} cannot contain whitespace")]
    WhitespaceInCredential(&'static str),
}

/// A command understood by the vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter SDK mode; doubles as a liveness check
    Enter,
    /// Battery percentage query
    Battery,
    /// Full status dump query
    Status,
    StreamOn,
    StreamOff,
    Takeoff,
    Land,
    Up(u32),
    Down(u32),
    /// Change the vehicle's access point credentials
    Wifi { ssid: String, password: String },
    /// Stop motors immediately
    Emergency,
}

impl Command {
    /// Build an `up` command, validating the distance
    pub fn up(cm: u32) -> Result<Self, ProtocolError> {
        check_distance(cm).map(Command::Up)
    }

    /// Build a `down` command, validating the distance
    pub fn down(cm: u32) -> Result<Self, ProtocolError> {
        check_distance(cm).map(Command::Down)
    }

    /// Build a `wifi` command, validating the credentials
    pub fn wifi(ssid: &str, password: &str) -> Result<Self, ProtocolError> {
        let ssid = check_credential("SSID", ssid)?;
        let password = check_credential("password", password)?;
        Ok(Command::Wifi {
            ssid: ssid.to_string(),
            password: password.to_string(),
        })
    }

    /// Wire bytes for this command
    pub fn payload(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Text safe to write to logs; hides the WiFi password
    pub fn redacted(&self) -> String {
        match self {
            Command::Wifi { ssid, .. } => format!("wifi {} ********", ssid),
            other => other.to_string(),
        }
    }

    /// Whether this command reads state instead of changing it
    pub fn is_query(&self) -> bool {
        matches!(self, Command::Battery | Command::Status)
    }

    /// Whether a response confirms this command
    ///
    /// Queries accept any non-error answer; everything else wants `ok`.
    pub fn is_affirmative(&self, response: &str) -> bool {
        let parsed = Response::parse(response);
        if self.is_query() {
            !matches!(parsed, Response::Error(_))
        } else {
            parsed == Response::Ok
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Enter => write!(f, "command"),
            Command::Battery => write!(f, "battery?"),
            Command::Status => write!(f, "status?"),
            Command::StreamOn => write!(f, "streamon"),
            Command::StreamOff => write!(f, "streamoff"),
            Command::Takeoff => write!(f, "takeoff"),
            Command::Land => write!(f, "land"),
            Command::Up(cm) => write!(f, "up {}", cm),
            Command::Down(cm) => write!(f, "down {}", cm),
            Command::Wifi { ssid, password } => write!(f, "wifi {} {}", ssid, password),
            Command::Emergency => write!(f, "emergency"),
        }
    }
}

fn check_distance(cm: u32) -> Result<u32, ProtocolError> {
    if (limits::MIN_MOVE_CM..=limits::MAX_MOVE_CM).contains(&cm) {
        Ok(cm)
    } else {
        Err(ProtocolError::DistanceOutOfRange(cm))
    }
}

fn check_credential<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::EmptyCredential(field));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ProtocolError::WhitespaceInCredential(field));
    }
    Ok(value)
}

/// Classified response text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    /// Integer answer to a query (battery, speed, time...)
    Value(i64),
    /// Error text reported by the vehicle
    Error(String),
    /// Any other text, e.g. a status dump
    Text(String),
}

impl Response {
    /// Classify already-trimmed response text
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("ok") {
            return Response::Ok;
        }

        let lower = text.to_ascii_lowercase();
        if lower.starts_with("error") || lower.starts_with("out of range") {
            return Response::Error(text.to_string());
        }

        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(value) = text.parse() {
                return Response::Value(value);
            }
        }

        Response::Text(text.to_string())
    }
}
