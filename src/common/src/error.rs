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

/// Distinguishes errors the retry envelope should retry indefinitely from
/// errors that are programmer/data mistakes and must surface immediately.
///
/// Network timeouts, connection resets, and "another process holds the
/// lock" are transient. A malformed watermark or an unknown process kind
/// is not: retrying it forever would just mask the bug (see `spec.md` §9,
/// "unbounded retry on logical errors").
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Leaf error for the state-store / lock layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state store transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("value for key {key:?} is not valid UTF-8")]
    NotUtf8 { key: String },

    #[error("another process holds the run lock")]
    LockHeld,
}

impl Retryable for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::LockHeld)
    }
}
