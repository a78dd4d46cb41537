use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Errors from the relational store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Connection-level failures that may succeed on a fresh attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            )
        )
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }
}

/// Build the connection pool described by the configuration.
///
/// The pool connects lazily, so the process starts even while the database is
/// still coming up; `health_check` reports the actual state.
pub fn connect(config: &DatabaseConfig) -> PgPool {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.dbname);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy_with(options);

    info!(
        "Configured database pool for {}@{}:{}/{} (max {} connections)",
        config.user, config.host, config.port, config.dbname, config.max_connections
    );
    pool
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Bounded retry for idempotent reads. Writes are never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub async fn read<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, DatabaseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DatabaseError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{} failed ({}), retry {}/{}", what, e, attempt, self.max_retries);
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}
