//! Schema migrations via [`refinery`].
//!
//! The companies/jobs schema ships embedded in the crate (`migrations/`).

use crate::error::JoblyResult;
use refinery::Report;

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Apply pending migrations on a single connection.
pub async fn run(client: &mut tokio_postgres::Client) -> JoblyResult<Report> {
    let report = embedded::migrations::runner().run_async(client).await?;
    for migration in report.applied_migrations() {
        tracing::info!(
            version = migration.version(),
            name = migration.name(),
            "applied migration"
        );
    }
    Ok(report)
}

/// Apply pending migrations using a pooled connection.
#[cfg(feature = "pool")]
pub async fn run_pool(pool: &deadpool_postgres::Pool) -> JoblyResult<Report> {
    let mut client = pool.get().await?;
    run(&mut client).await
}
