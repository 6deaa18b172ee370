// Copyright 2024 The Catalog Sync Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::Retryable;

const INITIAL_DELAY_MS: u64 = 1000;
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Wraps a fallible async operation with capped exponential backoff, retrying
/// indefinitely while the error is [`Retryable::is_transient`].
///
/// The Python original this daemon replaces computed the next delay with
/// `start_sleep_time * (2 ^ int(factor))` — a bitwise XOR where `**`
/// (exponentiation) was meant, so the delay never actually grew the way the
/// docstring claimed. This builds the sequence from
/// [`tokio_retry::strategy::ExponentialBackoff`] instead, which really
/// doubles, and caps at `border = 10s` the same way.
///
/// The backoff sleep is raced against `cancel` so a cancelled process
/// doesn't block on an in-flight wait (the original used an uninterruptible
/// `time.sleep`).
pub async fn retry<T, E, F, Fut>(cancel: &CancellationToken, mut op: F) -> Result<T, E>
where
    E: Retryable + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = ExponentialBackoff::from_millis(2)
        .factor(INITIAL_DELAY_MS)
        .max_delay(MAX_DELAY)
        .map(jitter);

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                error!(error = %err, "operation failed, retrying");
                let delay = backoff.next().unwrap_or(MAX_DELAY);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(err),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct TransientErr;

    impl Retryable for TransientErr {
        fn is_transient(&self) -> bool {
            true
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("fatal")]
    struct FatalErr;

    impl Retryable for FatalErr {
        fn is_transient(&self) -> bool {
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result: Result<u32, TransientErr> = retry(&cancel, || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 3 {
                Err(TransientErr)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result: Result<u32, FatalErr> = retry(&cancel, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(FatalErr)
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<u32, TransientErr> =
            retry(&cancel, || async { Err(TransientErr) }).await;

        assert!(result.is_err());
    }
}
