use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often a failing quote request is repeated, and how long to wait
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(retries: usize, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Total number of calls, including the first one.
    pub fn attempts(&self) -> usize {
        self.retries + 1
    }
}

/// Runs `operation` until it succeeds or `policy` is exhausted. The last
/// error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    label: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) if attempt < policy.attempts() => {
                debug!(
                    "{}: attempt {}/{} failed: {}",
                    label,
                    attempt,
                    policy.attempts(),
                    err
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1));

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = with_retry("USDMMK=X", FAST, || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(anyhow!("flaky"))
            } else {
                Ok(4500.0)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 4500.0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let result: Result<f64, Error> = with_retry("THBMMK=X", policy, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("down"))
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), policy.attempts());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        let _: Result<(), Error> =
            with_retry("EURMMK=X", policy, || async { Err(anyhow!("down")) }).await;
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
