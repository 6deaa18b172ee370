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

use catalog_sync_common::error::{Retryable, StoreError};

/// Errors surfaced by the connector crate: state store, extraction, and
/// loading. Validation failures are deliberately not an error variant here —
/// per the validator's contract it only filters, it never raises.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("source query failed: {0}")]
    Extract(#[source] anyhow::Error),

    #[error("sink bulk index failed: {0}")]
    Load(#[source] anyhow::Error),

    /// A watermark value that doesn't parse as `YYYY-MM-DD HH:MM:SS.ffffff`.
    /// Fatal per `spec.md` §7 — surfaced immediately, never retried.
    #[error("watermark {raw:?} for key {key:?} is not a valid timestamp")]
    MalformedWatermark { key: String, raw: String },
}

impl Retryable for ConnectorError {
    fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Store(e) => e.is_transient(),
            ConnectorError::Extract(_) | ConnectorError::Load(_) => true,
            ConnectorError::MalformedWatermark { .. } => false,
        }
    }
}
