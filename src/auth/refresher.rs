//! Background renewal of the cached token.
//!
//! [`TokenManager::start`] fetches once, then spawns a loop that sleeps until
//! `margin` before the held token expires, fetches a replacement and reschedules
//! from the new expiry. Failed fetches are logged and retried on the previous
//! interval; nothing is surfaced to callers.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::fetcher::TokenFetcher;
use super::store::{Token, TokenStore};

/// Timing of the refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// How long before expiry a replacement is fetched (default: 30 seconds)
    pub margin: Duration,
    /// Interval used when no expiry is known (default: 60 seconds)
    pub fallback_interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            margin: Duration::from_secs(30),
            fallback_interval: Duration::from_secs(60),
        }
    }
}

impl RefreshPolicy {
    /// Delay from `now` until `token` should be replaced.
    ///
    /// Zero when the refresh point has already passed.
    pub fn delay_for(&self, token: &Token, now: SystemTime) -> Duration {
        if !token.has_expiry() {
            return self.fallback_interval;
        }

        token
            .expires_at()
            .checked_sub(self.margin)
            .and_then(|fire_at| fire_at.duration_since(now).ok())
            .unwrap_or(Duration::ZERO)
    }

    fn retry_interval(&self, previous: Duration) -> Duration {
        if previous.is_zero() {
            self.fallback_interval
        } else {
            previous
        }
    }
}

/// Owns the refresh task of one [`TokenStore`].
///
/// Dropping the manager stops the task.
#[derive(Debug)]
pub struct TokenManager {
    store: Arc<TokenStore>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TokenManager {
    /// Populate `store` with one fetch and spawn the refresh loop.
    ///
    /// A failed first fetch leaves the empty token in place; the loop retries it.
    /// Cancelling `shutdown` stops the loop.
    pub async fn start<F>(
        store: Arc<TokenStore>,
        fetcher: F,
        policy: RefreshPolicy,
        shutdown: &CancellationToken,
    ) -> Self
    where
        F: TokenFetcher + 'static,
    {
        match fetcher.fetch().await {
            Ok(token) => {
                info!(expires_at_ms = token.expires_at_millis(), "Obtained access token");
                store.replace(token);
            }
            Err(e) => error!(error = %e, "Initial token fetch failed"),
        }

        let interval = policy.delay_for(&store.current(), SystemTime::now());
        let cancel = shutdown.child_token();
        let task = tokio::spawn(refresh_loop(
            store.clone(),
            fetcher,
            policy,
            interval,
            cancel.clone(),
        ));

        Self {
            store,
            cancel,
            task: Some(task),
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the refresh loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Token refresher ended abnormally");
            }
        }
    }
}

impl Drop for TokenManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_loop<F>(
    store: Arc<TokenStore>,
    fetcher: F,
    policy: RefreshPolicy,
    mut interval: Duration,
    cancel: CancellationToken,
) where
    F: TokenFetcher,
{
    loop {
        debug!(delay_ms = interval.as_millis() as u64, "Next token refresh scheduled");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = fetcher.fetch() => result,
        };

        match result {
            Ok(token) => {
                if !token.has_expiry() {
                    warn!("Token response carried no expiry, using fallback interval");
                }
                interval = policy.delay_for(&token, SystemTime::now());
                info!(expires_at_ms = token.expires_at_millis(), "Refreshed access token");
                store.replace(token);
            }
            Err(e) => {
                interval = policy.retry_interval(interval);
                error!(error = %e, "Token refresh failed");
            }
        }
    }

    debug!("Token refresher stopped");
}
