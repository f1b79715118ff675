//! Ctrl-C held for the whole session
//!
//! One watcher task owns the signal so an interrupt during a prompt or during
//! shutdown is still seen. A second Ctrl-C exits the process.

use std::future::Future;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Exit status used when the operator insists
const FORCED_EXIT_CODE: i32 = 130;

/// Latched interrupt flag
#[derive(Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Flag plus the sender that raises it
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Install the Ctrl-C watcher
    pub fn ctrl_c() -> Self {
        let (tx, interrupt) = Self::channel();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("[SESSION] Cannot listen for Ctrl-C: {}", e);
                // Keep the sender so waiters stay pending instead of firing
                std::future::pending::<()>().await;
            }
            info!("[SESSION] Program interrupted");
            let _ = tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("[SESSION] Interrupted again, exiting without teardown");
                std::process::exit(FORCED_EXIT_CODE);
            }
            std::future::pending::<()>().await;
        });
        interrupt
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised; never if the sender is gone unraised
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|&hit| hit).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless the operator interrupts first
    pub async fn guard<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        if self.is_set() {
            return None;
        }
        tokio::select! {
            output = fut => Some(output),
            _ = self.wait() => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_guard_passes_through_when_quiet() {
        let (_tx, mut interrupt) = Interrupt::channel();
        let value = interrupt.guard(async { 7 }).await;
        assert_eq!(value, Some(7));
        assert!(!interrupt.is_set());
    }

    #[tokio::test]
    async fn test_interrupt_cuts_pending_prompt() {
        let (tx, mut interrupt) = Interrupt::channel();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            let _ = tx.send(true);
        });

        let prompt = std::future::pending::<Option<String>>();
        let outcome = timeout(Duration::from_secs(1), interrupt.guard(prompt)).await;

        assert_eq!(outcome.unwrap(), None);
        assert!(interrupt.is_set());
    }

    #[tokio::test]
    async fn test_interrupt_stays_latched() {
        let (tx, mut interrupt) = Interrupt::channel();
        tx.send(true).unwrap();

        // Every later await point sees it too
        assert_eq!(interrupt.guard(async { 1 }).await, None);
        assert!(timeout(Duration::from_millis(100), interrupt.wait()).await.is_ok());
        let mut other = interrupt.clone();
        assert!(timeout(Duration::from_millis(100), other.wait()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_sender_never_fires() {
        let (tx, mut interrupt) = Interrupt::channel();
        drop(tx);

        assert!(timeout(Duration::from_millis(100), interrupt.wait()).await.is_err());
        assert_eq!(interrupt.guard(async { "line" }).await, Some("line"));
    }
}
