//! Exponential backoff for idempotent reads.
//!
//! Only stock loads and catalog/reconciliation reads go through here.
//! Orders, transfers and catalog writes are submitted exactly once.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use tracing::warn;

use crate::config::RetrySettings;
use crate::error::{ClientError, ClientResult};

/// Backoff parameters for read retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// `None` disables retrying.
    pub max_elapsed: Option<Duration>,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            max_elapsed: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_elapsed.is_some()
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: self.max_elapsed,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            max_elapsed: match settings.max_elapsed_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Runs `op`, retrying while it fails with a retryable error.
///
/// Remote rejections (other than gateway errors) and decode failures are
/// returned immediately.
pub async fn with_read_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    if !policy.is_enabled() {
        return op().await;
    }

    backoff::future::retry_notify(
        policy.create_backoff(),
        || {
            let attempt = op();
            async move {
                attempt.await.map_err(|e| {
                    if e.is_retryable() {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        },
        |e: ClientError, delay: Duration| {
            warn!(operation = what, error = %e, ?delay, "Read failed, retrying");
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            max_elapsed: Some(Duration::from_secs(2)),
        }
    }

    #[test]
    fn test_policy_from_settings() {
        let policy = RetryPolicy::from(&RetrySettings::default());
        assert_eq!(policy.initial_backoff, Duration::from_millis(250));
        assert_eq!(policy.max_backoff, Duration::from_secs(5));
        assert_eq!(policy.max_elapsed, Some(Duration::from_secs(20)));

        let disabled = RetryPolicy::from(&RetrySettings {
            max_elapsed_secs: 0,
            ..RetrySettings::default()
        });
        assert!(!disabled.is_enabled());
    }

    #[tokio::test]
    async fn test_retries_network_failures_until_success() {
        let attempts = AtomicU32::new(0);

        let result = with_read_retry(&fast_policy(), "load_stock", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClientError::NetworkFailure("connection refused".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: ClientResult<()> = with_read_retry(&fast_policy(), "list_stores", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ClientError::RemoteRejected {
                    status: 403,
                    message: "Forbidden".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ClientError::RemoteRejected { status: 403, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_policy_runs_once() {
        let attempts = AtomicU32::new(0);

        let result: ClientResult<()> = with_read_retry(&RetryPolicy::none(), "list_bundles", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::NetworkFailure("timeout".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
