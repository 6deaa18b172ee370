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

//! Typed key/value facade over the external state store, with the retry
//! envelope applied to every operation (`spec.md` §4.1: "Applied at three
//! layers: state-store calls (each of get/set/delete) ...").

use async_trait::async_trait;
use catalog_sync_common::error::StoreError;
use catalog_sync_common::retry::retry;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio_util::sync::CancellationToken;

/// The lock key guarding mutual exclusion across process runs.
pub const LOCK_KEY: &str = "process_is_started";

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the value at `key`, or `None` if it is absent or not valid
    /// UTF-8 (`spec.md` §4.2: "absent when the key is missing or
    /// binary-undecodable").
    async fn get(&self, cancel: &CancellationToken, key: &str) -> Result<Option<String>, StoreError>;

    /// Last-writer-wins set.
    async fn set(&self, cancel: &CancellationToken, key: &str, value: &str) -> Result<(), StoreError>;

    /// Idempotent delete; missing keys are not an error.
    async fn delete(&self, cancel: &CancellationToken, keys: &[&str]) -> Result<(), StoreError>;
}

/// Redis-backed implementation. Holds a [`ConnectionManager`], which
/// transparently reconnects, so each call only needs the retry envelope for
/// the request itself, not connection re-establishment.
pub struct RedisStateStore {
    conn: ConnectionManager,
}

impl RedisStateStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_tokio_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, cancel: &CancellationToken, key: &str) -> Result<Option<String>, StoreError> {
        retry(cancel, || async {
            let mut conn = self.conn.clone();
            let raw: Option<Vec<u8>> = conn
                .get(key)
                .await
                .map_err(|e| StoreError::Transport(e.into()))?;
            match raw {
                None => Ok(None),
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(s) => Ok(Some(s)),
                    Err(_) => Err(StoreError::NotUtf8 { key: key.to_string() }),
                },
            }
        })
        .await
    }

    async fn set(&self, cancel: &CancellationToken, key: &str, value: &str) -> Result<(), StoreError> {
        retry(cancel, || async {
            let mut conn = self.conn.clone();
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(|e| StoreError::Transport(e.into()))
        })
        .await
    }

    async fn delete(&self, cancel: &CancellationToken, keys: &[&str]) -> Result<(), StoreError> {
        retry(cancel, || async {
            let mut conn = self.conn.clone();
            conn.del::<_, ()>(keys)
                .await
                .map_err(|e| StoreError::Transport(e.into()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStateStore;

    #[tokio::test]
    async fn delete_of_missing_key_is_not_an_error() {
        let store = InMemoryStateStore::default();
        let cancel = CancellationToken::new();
        assert!(store.delete(&cancel, &["nope"]).await.is_ok());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = InMemoryStateStore::default();
        let cancel = CancellationToken::new();
        store.set(&cancel, LOCK_KEY, "1").await.unwrap();
        assert_eq!(store.get(&cancel, LOCK_KEY).await.unwrap().as_deref(), Some("1"));
    }
}
