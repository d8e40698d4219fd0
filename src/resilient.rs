//! リトライ付きUI操作
//!
//! A UI action is attempted up to [`RetryPolicy::attempts`] times with a
//! fixed wait between failures. The last failure is returned wrapped in
//! [`EntryError::ActionFailed`]; nothing is swallowed.

use crate::browser::UiSession;
use crate::error::{EntryError, Result};
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total attempts, at least 1
    pub attempts: u32,
    /// pause after each failed attempt
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            wait: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, wait: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            wait,
        }
    }
}

/// Value of a successful action and how many retries it took
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub retries: u32,
}

/// Runs `action` against `ctx` until it succeeds or the policy runs out.
///
/// The action receives `ctx` afresh on every attempt, so it must be safe to
/// repeat (re-query the page rather than reuse handles from a previous try).
///
/// # Errors
/// [`EntryError::ActionFailed`] carrying the last failure.
pub async fn perform<C, T, F>(
    ctx: &mut C,
    policy: RetryPolicy,
    label: &str,
    mut action: F,
) -> Result<Attempted<T>>
where
    C: ?Sized + Send,
    F: FnMut(&mut C) -> BoxFuture<'_, Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match action(&mut *ctx).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(Attempted {
                    value,
                    retries: attempt - 1,
                });
            }
            Err(e) if attempt < attempts => {
                warn!("Retry {} for {}: {}", attempt, label, e);
                tokio::time::sleep(policy.wait).await;
            }
            Err(e) => {
                return Err(EntryError::ActionFailed {
                    action: label.to_string(),
                    attempts,
                    source: Box::new(e),
                });
            }
        }
    }
}

/// Waits (bounded) for `selector` to show and clicks it, with retries.
/// Returns the number of retries used.
pub async fn click_when_visible<S: UiSession + ?Sized>(
    session: &mut S,
    policy: RetryPolicy,
    selector: &str,
    timeout: Duration,
) -> Result<u32> {
    let label = format!("click {}", selector);
    let attempted = perform(session, policy, &label, |s| {
        let selector = selector.to_string();
        Box::pin(async move {
            s.wait_for_visible(&selector, timeout).await?;
            s.click(&selector).await
        })
    })
    .await?;
    Ok(attempted.retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_fail_twice_then_succeed() {
        let mut calls = 0u32;
        let result = perform(&mut calls, quick(3), "flaky", |calls| {
            Box::pin(async move {
                *calls += 1;
                if *calls < 3 {
                    Err(EntryError::ElementNotFound("#x".into()))
                } else {
                    Ok("done")
                }
            })
        })
        .await
        .unwrap();

        assert_eq!(result.value, "done");
        assert_eq!(result.retries, 2);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_runs_exactly_the_budget() {
        let mut calls = 0u32;
        let err = perform(&mut calls, quick(3), "broken", |calls| {
            Box::pin(async move {
                *calls += 1;
                Err::<(), _>(EntryError::ElementNotFound("#x".into()))
            })
        })
        .await
        .unwrap_err();

        assert_eq!(calls, 3);
        match err {
            EntryError::ActionFailed {
                action,
                attempts,
                source,
            } => {
                assert_eq!(action, "broken");
                assert_eq!(attempts, 3);
                assert!(matches!(*source, EntryError::ElementNotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_first_try_has_no_retries() {
        let mut calls = 0u32;
        let result = perform(&mut calls, quick(3), "steady", |calls| {
            Box::pin(async move {
                *calls += 1;
                Ok(*calls)
            })
        })
        .await
        .unwrap();
        assert_eq!(result.retries, 0);
        assert_eq!(result.value, 1);
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
        assert_eq!(RetryPolicy::default().attempts, 3);
        assert_eq!(RetryPolicy::default().wait, Duration::from_millis(500));
    }
}
