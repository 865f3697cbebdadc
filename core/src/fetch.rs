//! Bounded-retry wrapper around remote calls.
//!
//! A fetch either yields a value or [`Unavailable`]. Callers treat `Unavailable`
//! as "leave the existing output alone", never as zero.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stream_out_types::RetrySettings;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::api::{ApiError, Permission, PermissionCheck};

/// Why a fetch produced no value.
#[derive(Debug, Error)]
pub enum Unavailable {
    #[error("missing API permission for {what}")]
    PermissionDenied { what: &'static str },
    #[error("{what} failed after {attempts} attempts: {source}")]
    Exhausted {
        what: &'static str,
        attempts: u32,
        #[source]
        source: ApiError,
    },
    #[error("{what} rejected: {source}")]
    Rejected {
        what: &'static str,
        #[source]
        source: ApiError,
    },
    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },
}

/// Fixed-delay retry with a per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            timeout,
        }
    }

    /// Longest time a single fetch can take before giving up.
    pub fn worst_case(&self) -> Duration {
        self.timeout * self.attempts + self.delay * (self.attempts - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(
            settings.attempts,
            Duration::from_millis(settings.delay_ms),
            Duration::from_millis(settings.timeout_ms),
        )
    }
}

pub struct Fetcher {
    policy: RetryPolicy,
    permissions: Arc<dyn PermissionCheck>,
}

impl Fetcher {
    pub fn new(policy: RetryPolicy, permissions: Arc<dyn PermissionCheck>) -> Self {
        Self {
            policy,
            permissions,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// `scopes` are checked before the first call; a missing scope short-circuits
    /// without touching the network.
    pub async fn fetch<T, F, Fut>(
        &self,
        what: &'static str,
        scopes: &[Permission],
        mut op: F,
    ) -> Result<T, Unavailable>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !self.permissions.has_permissions(scopes) {
            tracing::debug!(what, ?scopes, "Skipping fetch, permission not granted");
            return Err(Unavailable::PermissionDenied { what });
        }

        let attempts = self.policy.attempts;
        let mut attempt = 1;
        loop {
            let result = match timeout(self.policy.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    tracing::warn!(what, error = %e, "Fetch rejected");
                    return Err(Unavailable::Rejected { what, source: e });
                }
                Err(e) if attempt >= attempts => {
                    tracing::warn!(what, attempts, error = %e, "Fetch failed, giving up");
                    return Err(Unavailable::Exhausted {
                        what,
                        attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(what, attempt, error = %e, "Fetch failed, retrying");
                    attempt += 1;
                    sleep(self.policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GrantedPermissions;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fetcher(attempts: u32) -> Fetcher {
        Fetcher::new(
            RetryPolicy::new(attempts, Duration::from_secs(30), Duration::from_secs(30)),
            Arc::new(GrantedPermissions::all()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = fetcher(3)
            .fetch("achievements", &[], || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ApiError::Network("connection reset".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<i64, _> = fetcher(2)
            .fetch("wallet", &[], || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::RateLimited) }
            })
            .await;

        assert!(matches!(
            result,
            Err(Unavailable::Exhausted {
                attempts: 2,
                source: ApiError::RateLimited,
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<i64, _> = fetcher(5)
            .fetch("account", &[], || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Unauthorized) }
            })
            .await;

        assert!(matches!(result, Err(Unavailable::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let result: Result<i64, _> = fetcher(2)
            .fetch("pvp stats", &[], || async {
                std::future::pending::<()>().await;
                Ok(1)
            })
            .await;

        assert!(matches!(
            result,
            Err(Unavailable::Exhausted {
                source: ApiError::Timeout,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_permission_skips_the_call() {
        let fetcher = Fetcher::new(
            RetryPolicy::default(),
            Arc::new(GrantedPermissions::new([Permission::Account])),
        );
        let calls = AtomicU32::new(0);
        let result: Result<i64, _> = fetcher
            .fetch("wallet", &[Permission::Account, Permission::Wallet], || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(1) }
            })
            .await;

        assert!(matches!(result, Err(Unavailable::PermissionDenied { what: "wallet" })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_worst_case_latency() {
        let policy = RetryPolicy::new(3, Duration::from_secs(30), Duration::from_secs(30));
        assert_eq!(policy.worst_case(), Duration::from_secs(150));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).attempts, 1);
    }
}
