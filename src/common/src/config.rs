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

use clap::Parser;

fn default_db_buffer_size() -> usize {
    100
}

fn default_restart_interval_secs() -> u64 {
    10
}

/// Daemon configuration, read once at startup from the environment. There
/// are no positional flags — the process takes no CLI arguments, matching
/// "CLI surface: single entry point with no flags" (`spec.md` §6).
#[derive(Parser, Clone, Debug)]
#[command(version, about = "Incrementally mirrors the movie catalog into the search index")]
pub struct DaemonOpts {
    #[clap(long, env = "PG_DB_NAME")]
    pub pg_db_name: String,

    #[clap(long, env = "PG_DB_USER")]
    pub pg_db_user: String,

    #[clap(long, env = "PG_DB_PASSWORD")]
    pub pg_db_password: String,

    #[clap(long, env = "PG_DB_HOST", default_value = "127.0.0.1")]
    pub pg_db_host: String,

    #[clap(long, env = "PG_DB_PORT", default_value_t = 5432)]
    pub pg_db_port: u16,

    #[clap(long, env = "ES_HOST", default_value = "127.0.0.1")]
    pub es_host: String,

    #[clap(long, env = "ES_PORT", default_value_t = 9200)]
    pub es_port: u16,

    #[clap(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    pub redis_host: String,

    #[clap(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    /// Row count fetched per batch from the source cursor.
    #[clap(long, env = "DB_BUFFER_SIZE", default_value_t = default_db_buffer_size())]
    pub db_buffer_size: usize,

    /// Seconds the scheduler sleeps between full sweeps of all process kinds.
    #[clap(
        long,
        env = "TIME_TO_RESTART_PROCESSES_SECONDS",
        default_value_t = default_restart_interval_secs()
    )]
    pub time_to_restart_processes_secs: u64,
}

impl DaemonOpts {
    pub fn pg_connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.pg_db_host, self.pg_db_port, self.pg_db_user, self.pg_db_password, self.pg_db_name
        )
    }

    pub fn es_url(&self) -> String {
        format!("http://{}:{}", self.es_host, self.es_port)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}
