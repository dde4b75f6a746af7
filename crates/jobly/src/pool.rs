//! Connection pool utilities

use crate::config::DbConfig;
use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a [`DbConfig`].
///
/// Uses `NoTls` and fast recycling.
///
/// # Example
///
/// ```ignore
/// let pool = jobly::create_pool(&jobly::DbConfig::from_env()?)?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(config: &DbConfig) -> JoblyResult<Pool> {
    let pg_config: tokio_postgres::Config = config
        .database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    let pool = Pool::builder(mgr)
        .max_size(config.max_pool_size)
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))?;

    tracing::info!(max_size = config.max_pool_size, "created postgres pool");
    Ok(pool)
}

/// Create a pool and, if `config.run_migrations` is set, bring the schema up to date.
///
/// Without the `migrate` feature the flag is ignored.
pub async fn connect(config: &DbConfig) -> JoblyResult<Pool> {
    let pool = create_pool(config)?;

    #[cfg(feature = "migrate")]
    {
        if config.run_migrations {
            crate::migrate::run_pool(&pool).await?;
        }
    }

    Ok(pool)
}
