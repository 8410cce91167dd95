// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Timeouts and bounded retries for upstream calls
//!
//! Every call to the relay API or to a blob store runs under
//! [`UpstreamPolicy::timeout`]; expiry becomes [`StorageError::Transient`].
//! Idempotent operations (fetch, delete) may additionally go through
//! [`with_retry`], which only retries transient failures. Stores never do:
//! a retried relay upload would post the image twice.
//!
//! A streamed body outlives the call that opened it, so it is bounded
//! separately by [`with_idle_timeout`]: each chunk must arrive within the
//! policy timeout.

use crate::error::{StorageError, StorageResult};
use crate::BodyStream;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Timeout and retry budget applied to upstream calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamPolicy {
    /// Upper bound for a single upstream call
    pub timeout: Duration,

    /// Total attempts for retryable operations (1 disables retries)
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on every further attempt
    pub initial_backoff: Duration,
}

impl Default for UpstreamPolicy {
    fn default() -> Self {
        UpstreamPolicy {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl UpstreamPolicy {
    /// Policy with a single attempt and the given timeout
    pub fn no_retry(timeout: Duration) -> Self {
        UpstreamPolicy {
            timeout,
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }
}

/// Run `fut` under the policy timeout.
pub async fn with_timeout<T, F>(policy: &UpstreamPolicy, operation: &str, fut: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match tokio::time::timeout(policy.timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::transient(format!(
            "{} timed out after {:?}",
            operation, policy.timeout
        ))),
    }
}

/// Run `op` with the policy timeout, retrying transient failures with
/// exponential backoff (capped at 10 seconds).
pub async fn with_retry<T, F, Fut>(policy: &UpstreamPolicy, operation: &str, mut op: F) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = policy.initial_backoff;

    loop {
        match with_timeout(policy, operation, op()).await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Upstream call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(10));
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Fail `body` with a transient error once no chunk arrives for `idle`.
///
/// The stream ends after yielding that error.
pub fn with_idle_timeout(body: BodyStream, idle: Duration, operation: &'static str) -> BodyStream {
    stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(_) => {
                warn!(operation, idle_ms = idle.as_millis() as u64, "Upstream body stalled");
                Some((
                    Err(StorageError::transient(format!(
                        "{} stalled for {:?}",
                        operation, idle
                    ))),
                    None,
                ))
            }
        }
    })
    .boxed()
}
