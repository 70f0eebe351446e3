//! Cooperative shutdown signal
//!
//! The binary wires SIGINT/SIGTERM to a `watch` channel; engines hold a
//! [`ShutdownSignal`] and stop issuing new requests once it fires.
//! In-flight requests are allowed to finish.

use tokio::sync::watch;

/// Read side of the shutdown channel
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    ///
    /// Pends forever if the sender is dropped without firing.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl From<watch::Receiver<bool>> for ShutdownSignal {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_is_not_requested() {
        assert!(!ShutdownSignal::never().is_requested());
    }

    #[tokio::test]
    async fn test_wait_resolves_after_send() {
        let (tx, rx) = watch::channel(false);
        let signal = ShutdownSignal::new(rx);
        assert!(!signal.is_requested());

        tx.send(true).unwrap();
        signal.wait().await;
        assert!(signal.is_requested());
    }
}
