//! Retry wrapper for Spotify calls.
//!
//! Auth failures (401/403) are returned as-is. A 429 waits for the
//! `retry-after` hint when Spotify sends one, everything else backs off
//! exponentially: `initial_delay * 2^(attempt - 1)`.

use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{error::ApiError, warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of invocations, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// `retry-after` hints above this are not waited out.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_retry_after: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the given (1-based) attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }
}

/// Invokes `op` until it succeeds or the policy gives up.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_auth() => return Err(err),
            Err(err) => err,
        };

        let rate_limited = matches!(err, ApiError::RateLimited { .. });
        if attempt >= max_attempts {
            return Err(exhausted(err, attempt));
        }

        let delay = match &err {
            ApiError::RateLimited {
                retry_after: Some(hint),
            } => {
                if *hint > policy.max_retry_after {
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds. Try again later.",
                        hint.as_secs()
                    );
                    return Err(ApiError::RateLimitExhausted { attempts: attempt });
                }
                *hint
            }
            _ => policy.backoff(attempt),
        };

        if rate_limited {
            warning!(
                "Rate limited by Spotify, retrying in {:.1}s (attempt {}/{})",
                delay.as_secs_f64(),
                attempt + 1,
                max_attempts
            );
        } else {
            warning!(
                "{}; retrying in {:.1}s (attempt {}/{})",
                err,
                delay.as_secs_f64(),
                attempt + 1,
                max_attempts
            );
        }

        sleep(delay).await;
        attempt += 1;
    }
}

fn exhausted(err: ApiError, attempts: u32) -> ApiError {
    match err {
        ApiError::RateLimited { .. } => ApiError::RateLimitExhausted { attempts },
        other => ApiError::RetriesExhausted {
            attempts,
            source: Box::new(other),
        },
    }
}
