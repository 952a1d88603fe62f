use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;

use std::sync::Arc;

use brokerage::ledger::{LedgerStore, MemoryLedger, PgLedger};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub pg_con: String,
    #[serde(default = "bool_true")]
    pub migrate_on_start: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            pg_con: "".to_string(),
            migrate_on_start: true,
            pool_size: default_pool_size(),
        }
    }
}

fn bool_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    10
}

pub async fn init_pg_ledger(config: &DbConfig) -> anyhow::Result<PgLedger> {
    if config.pg_con.is_empty() {
        anyhow::bail!("db.pg_con (or PG_CON) must be set");
    }
    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .connect(&config.pg_con)
        .await
        .context("Couldn't connect to postgres")?;
    let ledger = PgLedger::new(pool);
    if config.migrate_on_start {
        ledger.migrate().await.context("Couldn't run migrations")?;
    }
    Ok(ledger)
}

/// Postgres when a connection string is configured, otherwise a process-local store.
pub async fn init_ledger(config: &DbConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    if config.pg_con.is_empty() {
        ::tracing::warn!("db.pg_con is empty, using the in-memory ledger");
        return Ok(Arc::new(MemoryLedger::new()));
    }
    Ok(Arc::new(init_pg_ledger(config).await?))
}
