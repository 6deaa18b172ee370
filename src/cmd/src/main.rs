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

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog_sync_common::config::DaemonOpts;
use catalog_sync_common::telemetry::init_tracing;
use catalog_sync_connector::loader::EsLoader;
use catalog_sync_connector::state_store::RedisStateStore;
use catalog_sync_runtime::process_runner::ProcessRunner;
use catalog_sync_runtime::scheduler::Scheduler;
use clap::Parser;
use elasticsearch::http::transport::Transport;
use elasticsearch::Elasticsearch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let opts = DaemonOpts::parse();
    init_tracing();

    if let Err(e) = run(opts).await {
        error!(error = %e, "fatal startup failure");
        std::process::exit(1);
    }
}

async fn run(opts: DaemonOpts) -> anyhow::Result<()> {
    let (pg_client, pg_connection) = tokio_postgres::connect(&opts.pg_connection_string(), tokio_postgres::NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = pg_connection.await {
            error!(error = %e, "postgres connection driver exited");
        }
    });

    let store = Arc::new(RedisStateStore::connect(&opts.redis_url()).await?);

    let transport = Transport::single_node(&opts.es_url())?;
    let es_client = Elasticsearch::new(transport);
    let loader = EsLoader::new(es_client);

    let cancel = CancellationToken::new();
    let mappings_dir = PathBuf::from(
        std::env::var("INDEX_MAPPINGS_DIR").unwrap_or_else(|_| "index_mappings".to_string()),
    );
    loader.bootstrap_indexes(&cancel, &mappings_dir).await?;

    let runner = ProcessRunner::new(pg_client, store, loader, opts.db_buffer_size);
    let scheduler = Scheduler::new(runner, Duration::from_secs(opts.time_to_restart_processes_secs));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received, finishing in-flight run");
            shutdown.cancel();
        }
    });

    scheduler.run(&cancel).await;
    info!("scheduler stopped, exiting");
    Ok(())
}
