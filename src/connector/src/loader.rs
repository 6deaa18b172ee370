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

//! Bulk-indexes adapted, validated documents into the sink, and bootstraps
//! its indexes at startup (`spec.md` §4.7).

use std::path::Path;

use catalog_sync_common::retry::retry;
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts};
use elasticsearch::{BulkOperation, BulkParts, Elasticsearch};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ConnectorError;

/// `(index name, mapping file name)` pairs known to the catalog.
pub const INDEXES: [(&str, &str); 3] = [
    ("movies", "movies.json"),
    ("genres", "genres.json"),
    ("persons", "persons.json"),
];

pub struct EsLoader {
    client: Elasticsearch,
}

impl EsLoader {
    pub fn new(client: Elasticsearch) -> Self {
        Self { client }
    }

    /// Creates every index in [`INDEXES`] from its on-disk mapping if it
    /// doesn't already exist. A second call against an already-bootstrapped
    /// cluster is a no-op (S6).
    pub async fn bootstrap_indexes(
        &self,
        cancel: &CancellationToken,
        mappings_dir: &Path,
    ) -> anyhow::Result<()> {
        for (index, file) in INDEXES {
            self.create_index_if_missing(cancel, index, &mappings_dir.join(file))
                .await?;
        }
        Ok(())
    }

    async fn create_index_if_missing(
        &self,
        cancel: &CancellationToken,
        index: &str,
        mapping_path: &Path,
    ) -> anyhow::Result<()> {
        let mapping = tokio::fs::read_to_string(mapping_path).await?;
        let body: Value = serde_json::from_str(&mapping)?;

        retry(cancel, || async {
            let exists = self
                .client
                .indices()
                .exists(IndicesExistsParts::Index(&[index]))
                .send()
                .await
                .map_err(|e| ConnectorError::Load(e.into()))?;
            if exists.status_code().is_success() {
                return Ok(());
            }

            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(index))
                .body(body.clone())
                .send()
                .await
                .map_err(|e| ConnectorError::Load(e.into()))?;

            if response.status_code().is_success() {
                info!(index, "created index");
                Ok(())
            } else {
                let status = response.status_code();
                let payload: Value = response
                    .json()
                    .await
                    .unwrap_or_else(|_| Value::String("<no body>".into()));
                if payload["error"]["type"] == "resource_already_exists_exception" {
                    Ok(())
                } else {
                    Err(ConnectorError::Load(anyhow::anyhow!(
                        "index creation for {index:?} failed with {status}: {payload}"
                    )))
                }
            }
        })
        .await?;
        Ok(())
    }

    /// Bulk-upserts `docs` (id, body) into `index`. Returns `true` once the
    /// bulk call itself succeeded at the transport level, independent of
    /// whether individual items inside it were rejected — those are logged,
    /// not propagated, per `spec.md` §7.
    pub async fn load(
        &self,
        cancel: &CancellationToken,
        index: &str,
        docs: &[(String, Value)],
    ) -> Result<bool, ConnectorError> {
        if docs.is_empty() {
            return Ok(true);
        }

        info!(index, count = docs.len(), "bulk indexing");

        retry(cancel, || async {
            let body: Vec<BulkOperation<Value>> = docs
                .iter()
                .map(|(id, doc)| BulkOperation::index(doc.clone()).id(id.as_str()).into())
                .collect();

            let response = self
                .client
                .bulk(BulkParts::Index(index))
                .body(body)
                .send()
                .await
                .map_err(|e| ConnectorError::Load(e.into()))?;

            let payload: Value = response
                .json()
                .await
                .map_err(|e| ConnectorError::Load(e.into()))?;

            if payload["errors"].as_bool().unwrap_or(false) {
                warn!(index, "bulk index completed with per-item errors, see sink logs");
            }
            Ok(true)
        })
        .await?;

        info!(index, "bulk index complete");
        Ok(true)
    }
}
