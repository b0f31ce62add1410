// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter, applied only to shell and
//! guarded-command steps by the task runner.

use std::future::Future;
use std::time::Duration;

use nexus_core::StepResult;

/// `retry_delay * 2^(attempt-1) * (1 + U[0, 0.2])` ms.
/// `attempt` is 1-based: the delay computed with `attempt = 1` is the
/// sleep before the *second* try.
pub fn backoff_delay_ms(retry_delay_ms: u64, attempt: u32) -> u64 {
    let base = retry_delay_ms as f64 * 2f64.powi((attempt - 1) as i32);
    let jitter = 1.0 + rand::random::<f64>() * 0.2;
    (base * jitter).round() as u64
}

/// Run `attempt_fn` until it reports a non-error status or the retry
/// budget is exhausted, sleeping between attempts per
/// [`backoff_delay_ms`]. The returned `StepResult.attempts` always
/// reflects the true attempt count, including the final one.
pub async fn run_with_retries<F, Fut>(retries: u32, retry_delay_ms: u64, mut attempt_fn: F) -> StepResult
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = StepResult>,
{
    let mut attempt: u32 = 1;
    loop {
        let mut result = attempt_fn(attempt).await;
        if result.status.is_ok_like() || attempt > retries {
            result.attempts = attempt;
            return result;
        }
        let delay = backoff_delay_ms(retry_delay_ms, attempt);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
