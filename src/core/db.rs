use std::time::Duration;

use sqlx::{migrate::Migrator, pool::PoolOptions, Pool, Postgres};

use crate::settings::Config;

/// Migrations under `./migrations`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn init_pool(config: &Config) -> Result<Pool<Postgres>, sqlx::Error> {
    PoolOptions::new()
        .min_connections(5)
        .max_connections(100)
        .idle_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
}
