//! Cooperative cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// A clonable cancellation flag shared between a caller and in-flight requests.
///
/// Every clone observes the same flag. Once raised it stays raised.
///
/// # Example
///
/// ```
/// use courier_core::CancelSignal;
///
/// let signal = CancelSignal::new();
/// let observer = signal.clone();
/// assert!(!observer.is_cancelled());
///
/// signal.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Creates a new, un-raised signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Raises the signal. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal is raised.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // The sender lives as long as `self`, so this never resolves.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn new_signal_is_not_cancelled() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled());

        // Idempotent
        signal.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_raised() {
        let signal = CancelSignal::new();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("already cancelled");
    }

    #[tokio::test]
    async fn cancelled_wakes_on_cancel() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        signal.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("woken")
            .expect("task");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_pends_until_raised() {
        let signal = CancelSignal::new();
        let result = tokio::time::timeout(Duration::from_secs(5), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
