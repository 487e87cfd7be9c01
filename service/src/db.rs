use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Overall time budget for reaching Postgres at startup.
const CONNECT_DEADLINE: Duration = Duration::from_secs(60);
/// Ceiling for a single backoff wait.
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Connect to Postgres (retrying while it boots) and apply migrations.
///
/// # Errors
/// Returns an error if no connection succeeds within the retry budget or a
/// migration fails.
pub async fn setup_database(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let url = config.connection_url();
    let mut delay = INITIAL_BACKOFF;
    let start = Instant::now();

    let pool = loop {
        info!(host = %config.host, port = config.port, db = %config.name, "connecting to Postgres");

        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await
        {
            Ok(pool) => break pool,
            Err(err) => {
                if start.elapsed() >= CONNECT_DEADLINE {
                    warn!(error = %err, "Postgres not ready; retries exhausted");
                    return Err(err.into());
                }

                warn!(error = %err, delay_ms = delay.as_millis(), "Postgres not ready yet; retrying");
                sleep(delay).await;
                delay = next_backoff(delay);
            }
        }
    };

    run_migrations(&pool, config.migrations_dir.as_deref()).await?;
    Ok(pool)
}

/// Apply migrations from `dir`, or from the crate's `migrations/` directory.
///
/// # Errors
/// Returns an error if the directory cannot be read or a migration fails.
pub async fn run_migrations(pool: &PgPool, dir: Option<&str>) -> Result<(), anyhow::Error> {
    let path = dir.map_or_else(default_migrations_dir, PathBuf::from);
    let migrator = Migrator::new(path.as_path()).await?;
    migrator.run(pool).await?;
    info!(path = %path.display(), "migrations applied");
    Ok(())
}

#[must_use]
pub fn default_migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}
