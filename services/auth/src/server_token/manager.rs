//! Background manager for this service's own server credential.
//!
//! A single refresh task logs in immediately on start, then keeps the
//! credential fresh: it waits the configured TTL after each success and
//! backs off (1s, 2s, 4s, ... capped at 60s) after failures. Failures are
//! logged and never reach readers; readers only ever see the last committed
//! credential.
//!
//! Shutdown is a handshake: [`ServerTokenManager::close`] hands the task a
//! one-shot acknowledgement channel and waits for it. The task checks for
//! the stop signal both while sleeping and while a login is in flight, so
//! an abandoned login never commits its result. Concurrent closers queue on
//! the same shutdown and all return only after the task has exited.

use crate::error::AuthError;
use crate::metrics;
use crate::server_token::{ServerLogin, ServerToken};
use parking_lot::Mutex;
use rust_common::{BackoffConfig, FailureBackoff, PlatformError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Credential = Arc<Mutex<Option<String>>>;
type StopSignal = oneshot::Sender<()>;

struct RefreshWorker {
    credential: Credential,
    stop_tx: oneshot::Sender<StopSignal>,
    handle: JoinHandle<()>,
}

/// Owns and refreshes the credential this service presents to its peers.
pub struct ServerTokenManager {
    login: Arc<dyn ServerLogin>,
    backoff: BackoffConfig,
    worker: Mutex<Option<RefreshWorker>>,
    closing: tokio::sync::Mutex<()>,
}

impl ServerTokenManager {
    /// Create a stopped manager.
    #[must_use]
    pub fn new(login: Arc<dyn ServerLogin>, backoff: BackoffConfig) -> Self {
        Self {
            login,
            backoff,
            worker: Mutex::new(None),
            closing: tokio::sync::Mutex::new(()),
        }
    }

    /// Launch the refresh task unless it is already running.
    ///
    /// Returns without waiting for the first login. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }

        let credential = Credential::default();
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = RefreshTask {
            login: Arc::clone(&self.login),
            credential: Arc::clone(&credential),
            backoff: FailureBackoff::new(self.backoff),
        };
        let handle = tokio::spawn(task.run(stop_rx));

        *worker = Some(RefreshWorker {
            credential,
            stop_tx,
            handle,
        });
        info!(ttl = ?self.backoff.steady_interval, "Server token manager started");
    }

    /// Stop the refresh task and wait until it has exited.
    ///
    /// No-op if the manager is not running. A close racing another one
    /// waits for the same task to exit before returning.
    pub async fn close(&self) {
        // Held until the task is joined so later closers cannot return early.
        let _closing = self.closing.lock().await;
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if worker.stop_tx.send(ack_tx).is_ok() {
            // The task drops the sender without acknowledging only if it is
            // already gone, which is just as final.
            let _ = ack_rx.await;
        }
        if let Err(e) = worker.handle.await {
            warn!(error = %e, "Server token refresh task ended abnormally");
        }
        info!("Server token manager closed");
    }

    /// Whether the refresh task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Most recently committed credential.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotStarted`] before [`start`](Self::start) or after
    ///   [`close`](Self::close).
    /// - [`AuthError::NoCredentialYet`] until the first login succeeds.
    pub fn current_token(&self) -> Result<String, AuthError> {
        let credential = self
            .worker
            .lock()
            .as_ref()
            .map(|worker| Arc::clone(&worker.credential))
            .ok_or(AuthError::NotStarted)?;

        let token = credential.lock().clone();
        token.ok_or(AuthError::NoCredentialYet)
    }
}

impl ServerToken for ServerTokenManager {
    fn server_token(&self) -> Result<String, AuthError> {
        self.current_token()
    }
}

struct RefreshTask {
    login: Arc<dyn ServerLogin>,
    credential: Credential,
    backoff: FailureBackoff,
}

impl RefreshTask {
    async fn run(mut self, mut stop_rx: oneshot::Receiver<StopSignal>) {
        loop {
            let outcome = tokio::select! {
                biased;
                stop = &mut stop_rx => return acknowledge(stop),
                outcome = self.login.login() => outcome,
            };

            let delay = self.commit(outcome);

            tokio::select! {
                biased;
                stop = &mut stop_rx => return acknowledge(stop),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Apply a login outcome and return the delay before the next attempt.
    fn commit(&mut self, outcome: Result<String, PlatformError>) -> Duration {
        metrics::record_refresh(outcome.is_ok());
        match outcome {
            Ok(token) => {
                *self.credential.lock() = Some(token);
                let delay = self.backoff.on_success();
                debug!(next_refresh = ?delay, "Server token refreshed");
                delay
            }
            Err(e) => {
                let delay = self.backoff.on_failure();
                warn!(error = %e, retry_in = ?delay, "Server token refresh failed");
                delay
            }
        }
    }
}

fn acknowledge(stop: Result<StopSignal, oneshot::error::RecvError>) {
    // Err means the manager was dropped without closing; just exit.
    if let Ok(ack) = stop {
        let _ = ack.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticLogin(&'static str);

    #[async_trait]
    impl ServerLogin for StaticLogin {
        async fn login(&self) -> Result<String, PlatformError> {
            Ok(self.0.to_string())
        }
    }

    fn manager() -> ServerTokenManager {
        ServerTokenManager::new(
            Arc::new(StaticLogin("server-token")),
            BackoffConfig::new(Duration::from_secs(3600)),
        )
    }

    #[test]
    fn test_not_started() {
        let manager = manager();
        assert!(!manager.is_running());
        assert!(matches!(manager.current_token(), Err(AuthError::NotStarted)));
    }

    #[tokio::test]
    async fn test_close_without_start_is_noop() {
        let manager = manager();
        manager.close().await;
        assert!(matches!(manager.server_token(), Err(AuthError::NotStarted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let manager = manager();
        manager.start();
        manager.start();
        assert!(manager.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.current_token().unwrap(), "server-token");

        manager.close().await;
        assert!(!manager.is_running());
        assert!(matches!(manager.current_token(), Err(AuthError::NotStarted)));
    }
}
