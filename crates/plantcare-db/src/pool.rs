use std::time::Duration;

use anyhow::{Context, Result, ensure};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Schema for the `plants` table, embedded from `crates/plantcare-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the pool shared by the plant store.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

/// Bring the plants schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(
        migrations = MIGRATOR.iter().count(),
        "plants schema is up to date"
    );
    Ok(())
}

/// Create the plantcare database on its server unless it is already there.
///
/// Returns `true` when the database was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .context("database URL does not name a database")?;
    // Interpolated into CREATE DATABASE below, which takes no bind parameters.
    ensure!(
        is_plain_identifier(db_name),
        "database name {db_name:?} must be ASCII letters, digits and underscores"
    );

    let server = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.maintenance_url())
        .await
        .context("failed to reach the postgres maintenance database")?;

    let created = create_if_missing(&server, db_name).await;
    server.close().await;

    let created = created?;
    if created {
        info!(db = db_name, "created plantcare database");
    } else {
        debug!(db = db_name, "plantcare database already present");
    }
    Ok(created)
}

async fn create_if_missing(server: &PgPool, db_name: &str) -> Result<bool> {
    let present: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(server)
            .await
            .context("failed to look up database in pg_database")?;
    if present {
        return Ok(false);
    }

    server
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .with_context(|| format!("failed to create database {db_name}"))?;
    Ok(true)
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("database ping failed")?;
    Ok(())
}
