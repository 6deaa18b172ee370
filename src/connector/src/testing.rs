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

//! Test doubles shared across crates. Not behind `#[cfg(test)]` because the
//! runtime crate's process-runner tests need an in-process `StateStore`
//! too; kept out of the default build's public surface expectations by
//! living in its own module.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use catalog_sync_common::error::StoreError;
use tokio_util::sync::CancellationToken;

use crate::state_store::StateStore;

#[derive(Default)]
pub struct InMemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn with(entries: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, _cancel: &CancellationToken, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, _cancel: &CancellationToken, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, _cancel: &CancellationToken, keys: &[&str]) -> Result<(), StoreError> {
        let mut guard = self.values.lock().unwrap();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}
