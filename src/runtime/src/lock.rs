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

//! The global run lock: a single boolean key serializing process runs
//! across schedulers (`spec.md` §3, §4.8). Acquisition polls through the
//! retry envelope; release is mandatory on every exit path, so it is
//! modeled as an RAII guard rather than a `try/finally`.

use std::sync::Arc;

use catalog_sync_common::error::StoreError;
use catalog_sync_common::retry::retry;
use catalog_sync_connector::state_store::{StateStore, LOCK_KEY};
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Polls until the lock is free, then claims it. Each poll attempt is one
/// retry-envelope iteration, so `cancel` also interrupts the wait (S4).
pub async fn acquire<S>(cancel: &CancellationToken, store: Arc<S>) -> Result<LockGuard<S>, StoreError>
where
    S: StateStore + Send + Sync + 'static,
{
    retry(cancel, || async {
        match store.get(cancel, LOCK_KEY).await? {
            Some(value) if value == "1" => Err(StoreError::LockHeld),
            _ => store.set(cancel, LOCK_KEY, "1").await,
        }
    })
    .await?;

    Ok(LockGuard {
        store,
        released: false,
    })
}

pub struct LockGuard<S: StateStore + Send + Sync + 'static> {
    store: Arc<S>,
    released: bool,
}

impl<S: StateStore + Send + Sync + 'static> LockGuard<S> {
    /// Releases the lock and consumes the guard. Prefer this over letting
    /// the guard drop: it lets the caller's cancellation token govern the
    /// release's own retries instead of falling back to an uncancellable one.
    pub async fn release(mut self, cancel: &CancellationToken) {
        if let Err(e) = release_once(cancel, &self.store).await {
            error!(error = %e, "failed to release global run lock");
        }
        self.released = true;
    }
}

async fn release_once<S: StateStore + Send + Sync + 'static>(
    cancel: &CancellationToken,
    store: &Arc<S>,
) -> Result<(), StoreError> {
    retry(cancel, || async { store.set(cancel, LOCK_KEY, "0").await }).await
}

impl<S: StateStore + Send + Sync + 'static> Drop for LockGuard<S> {
    /// Safety net for a guard dropped without an explicit `release` (e.g. the
    /// owning task was aborted). Spawns a best-effort, uncancellable release
    /// so the lock isn't stuck at `"1"` forever.
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            if let Err(e) = release_once(&cancel, &store).await {
                error!(error = %e, "failed to release global run lock from guard drop");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use catalog_sync_connector::testing::InMemoryStateStore;

    use super::*;

    #[tokio::test]
    async fn acquire_sets_the_lock_and_release_clears_it() {
        let store = Arc::new(InMemoryStateStore::default());
        let cancel = CancellationToken::new();

        let guard = acquire(&cancel, store.clone()).await.unwrap();
        assert_eq!(store.get(&cancel, LOCK_KEY).await.unwrap().as_deref(), Some("1"));

        guard.release(&cancel).await;
        assert_eq!(store.get(&cancel, LOCK_KEY).await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn acquire_blocks_while_held_until_cancelled() {
        let store = Arc::new(InMemoryStateStore::with([(LOCK_KEY, "1")]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = acquire(&cancel, store).await;
        assert!(result.is_err());
    }
}
