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

//! One run of one process kind: lock, extract, adapt, validate, load,
//! commit watermark, unlock (`spec.md` §4.8).

use std::sync::Arc;

use catalog_sync_common::time::parse_watermark;
use catalog_sync_connector::adapter::adapt;
use catalog_sync_connector::documents::validate;
use catalog_sync_connector::error::ConnectorError;
use catalog_sync_connector::extractor::RowExtractor;
use catalog_sync_connector::loader::EsLoader;
use catalog_sync_connector::process_kind::ProcessKind;
use catalog_sync_connector::query::build_query;
use catalog_sync_connector::state_store::StateStore;
use tokio_postgres::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::lock;

pub struct ProcessRunner<S: StateStore + Send + Sync + 'static> {
    pg: Client,
    store: Arc<S>,
    loader: EsLoader,
    db_buffer_size: usize,
}

impl<S: StateStore + Send + Sync + 'static> ProcessRunner<S> {
    pub fn new(pg: Client, store: Arc<S>, loader: EsLoader, db_buffer_size: usize) -> Self {
        Self {
            pg,
            store,
            loader,
            db_buffer_size,
        }
    }

    /// Runs `kind` exactly once: acquire → extract/adapt/validate/load →
    /// commit watermark → release. The lock is released on every exit path,
    /// including a malformed-watermark failure (S5).
    pub async fn run_once(&self, cancel: &CancellationToken, kind: ProcessKind) -> bool {
        let guard = match lock::acquire(cancel, self.store.clone()).await {
            Ok(guard) => guard,
            Err(e) => {
                error!(kind = %kind, error = %e, "failed to acquire run lock");
                return false;
            }
        };

        let result = self.run_locked(cancel, kind).await;
        guard.release(cancel).await;

        match result {
            Ok(success) => success,
            Err(e) => {
                error!(kind = %kind, error = %e, "process run failed");
                false
            }
        }
    }

    async fn run_locked(&self, cancel: &CancellationToken, kind: ProcessKind) -> Result<bool, ConnectorError> {
        let watermark_key = kind.watermark_key();
        let watermark = match self.store.get(cancel, watermark_key).await? {
            None => None,
            Some(raw) => Some(parse_watermark(&raw).ok_or_else(|| ConnectorError::MalformedWatermark {
                key: watermark_key.to_string(),
                raw,
            })?),
        };

        let sql = build_query(kind, watermark);
        let mut extractor = RowExtractor::new(&self.pg, sql, self.db_buffer_size);
        let mut docs = Vec::new();
        extractor
            .run(|batch| {
                for row in batch {
                    let Some(adapted) = adapt(row) else {
                        continue;
                    };
                    if let Some(doc) = validate(kind, adapted.body) {
                        docs.push((adapted.id, doc.to_value()));
                    }
                }
            })
            .await?;

        self.loader.load(cancel, kind.target_index(), &docs).await?;

        match extractor.last_modified_state_formatted() {
            Some(formatted) => self.store.set(cancel, watermark_key, &formatted).await?,
            None => info!(kind = %kind, "zero rows processed, watermark unchanged"),
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    //! `run_locked` needs a live Postgres client; the lock-exclusivity and
    //! watermark-commit behaviors it composes are covered directly in
    //! `lock` and in `catalog_sync_connector`'s unit tests, and end-to-end
    //! in the scheduler's integration test.
}
