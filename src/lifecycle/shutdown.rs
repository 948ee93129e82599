//! Shutdown coordination.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Wraps a watch channel every long-running task can subscribe to; the
/// signal is level-triggered, so late subscribers still observe it.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the shutdown signal.
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait until shutdown is triggered.
    pub async fn wait(mut self) {
        // Err means the coordinator is gone; treat that as shutdown too.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Trigger the coordinator on Ctrl-C or SIGTERM.
pub fn listen_for_signals(shutdown: &Shutdown) {
    let tx = shutdown.tx.clone();
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %error, "Failed to install Ctrl-C handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(error) => {
                    tracing::error!(error = %error, "Failed to install SIGTERM handler");
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }

        tracing::info!("Shutdown signal received");
        let _ = tx.send(true);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_releases_waiters() {
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();

        shutdown.trigger();
        // Must resolve promptly; wait_for observes the already-set value.
        tokio::time::timeout(std::time::Duration::from_secs(1), listener.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_late_subscriber_still_observes_shutdown() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let listener = shutdown.subscribe();
        tokio::time::timeout(std::time::Duration::from_secs(1), listener.wait())
            .await
            .unwrap();
    }
}
