//! Keyboard adapter - one key per line from the terminal

use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Emergency,
    ToggleVideo,
    Land,
    ConfigureWifi,
    Exit,
    Status,
    Takeoff,
}

impl Intent {
    /// Map a typed key to an intent; unknown keys map to nothing
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "1" => Some(Intent::Emergency),
            "2" => Some(Intent::ToggleVideo),
            "3" => Some(Intent::Land),
            "4" => Some(Intent::ConfigureWifi),
            "5" => Some(Intent::Exit),
            "6" => Some(Intent::Status),
            "t" | "T" => Some(Intent::Takeoff),
            _ => None,
        }
    }
}

/// Control legend shown once the session is active
pub const KEY_LEGEND: &[&str] = &[
    "1 - EMERGENCY STOP (motors stop immediately!)",
    "2 - Toggle video stream",
    "3 - Land",
    "4 - Configure WiFi",
    "5 - Exit program",
    "6 - Get drone status",
    "T - Takeoff",
];

/// Line-oriented key reader
///
/// Prompts share the same line stream so that answers typed for a prompt
/// are never taken as keys.
pub struct KeyboardInput {
    lines: mpsc::Receiver<String>,
}

impl KeyboardInput {
    pub fn new(lines: mpsc::Receiver<String>) -> Self {
        Self { lines }
    }

    /// Read the terminal on a dedicated thread
    ///
    /// A blocking stdin read cannot be cancelled, so it must not live on the
    /// runtime's blocking pool or it would hold up runtime shutdown.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(16);
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("[INPUT] Reading terminal failed: {}", e);
                        break;
                    }
                }
            }
        });
        Self::new(rx)
    }

    /// Next recognized intent, or `None` once input is closed
    pub async fn next_intent(&mut self) -> Option<Intent> {
        while let Some(line) = self.lines.recv().await {
            match Intent::from_key(&line) {
                Some(intent) => return Some(intent),
                None if line.trim().is_empty() => {}
                None => debug!("[INPUT] Ignoring key '{}'", line.trim()),
            }
        }
        None
    }

    /// Read one trimmed answer, or `None` once input is closed
    pub async fn prompt(&mut self, label: &str) -> Option<String> {
        println!("{}", label);
        self.lines.recv().await.map(|line| line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(lines: &[&str]) -> KeyboardInput {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            tx.try_send(line.to_string()).unwrap();
        }
        KeyboardInput::new(rx)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Intent::from_key("1"), Some(Intent::Emergency));
        assert_eq!(Intent::from_key("2"), Some(Intent::ToggleVideo));
        assert_eq!(Intent::from_key("3"), Some(Intent::Land));
        assert_eq!(Intent::from_key("4"), Some(Intent::ConfigureWifi));
        assert_eq!(Intent::from_key("5"), Some(Intent::Exit));
        assert_eq!(Intent::from_key("6"), Some(Intent::Status));
        assert_eq!(Intent::from_key("t"), Some(Intent::Takeoff));
        assert_eq!(Intent::from_key(" T "), Some(Intent::Takeoff));
        assert_eq!(Intent::from_key("7"), None);
        assert_eq!(Intent::from_key("takeoff"), None);
    }

    #[tokio::test]
    async fn test_unknown_keys_skipped() {
        let mut input = scripted(&["x", "", "3", "9", "5"]);

        assert_eq!(input.next_intent().await, Some(Intent::Land));
        assert_eq!(input.next_intent().await, Some(Intent::Exit));
        assert_eq!(input.next_intent().await, None);
    }

    #[tokio::test]
    async fn test_prompt_consumes_answer_line() {
        let mut input = scripted(&["4", "  HOME-NET ", "secret", "6"]);

        assert_eq!(input.next_intent().await, Some(Intent::ConfigureWifi));
        assert_eq!(input.prompt("SSID:").await.as_deref(), Some("HOME-NET"));
        assert_eq!(input.prompt("Password:").await.as_deref(), Some("secret"));
        assert_eq!(input.next_intent().await, Some(Intent::Status));
        assert_eq!(input.prompt("SSID:").await, None);
    }
}
