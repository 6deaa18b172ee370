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

//! Round-robins every process kind with a fixed restart interval
//! (`spec.md` §4.9). Cancellation is checked between kinds and during the
//! sweep sleep, never in the middle of a run (`spec.md` §5).

use std::time::Duration;

use catalog_sync_connector::process_kind::ProcessKind;
use catalog_sync_connector::state_store::StateStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::process_runner::ProcessRunner;

pub struct Scheduler<S: StateStore + Send + Sync + 'static> {
    runner: ProcessRunner<S>,
    restart_interval: Duration,
}

impl<S: StateStore + Send + Sync + 'static> Scheduler<S> {
    pub fn new(runner: ProcessRunner<S>, restart_interval: Duration) -> Self {
        Self {
            runner,
            restart_interval,
        }
    }

    /// Runs sweeps until `cancel` fires. Returns once the in-flight sweep's
    /// current kind finishes — an in-progress run is never interrupted
    /// mid-batch, only between kinds or during the inter-sweep sleep.
    pub async fn run(&self, cancel: &CancellationToken) {
        while !cancel.is_cancelled() {
            for kind in ProcessKind::ALL {
                if cancel.is_cancelled() {
                    return;
                }
                let succeeded = self.runner.run_once(cancel, kind).await;
                info!(kind = %kind, succeeded, "process run finished");
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.restart_interval) => {}
            }
        }
    }
}
