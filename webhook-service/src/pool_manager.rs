//! Database connection pool manager.
//!
//! Owns the single AlloyDB pool of this process. The pool is built lazily on
//! the first webhook call, guarded so that concurrent first calls construct
//! it exactly once, and is never torn down explicitly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::config::{AppConfig, DatabaseSettings};
use common::errors::{AppError, AppResult};
use common::models::query::{QueryResult, SqlStatement};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::pg_value::{column_info, row_values};

const APPLICATION_NAME: &str = "alloydb-webhook";

/// A pooled database able to run one statement inside its own transaction.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Runs `statement` on a connection checked out for this call only,
    /// commits, and returns every row.
    async fn run(&self, statement: &SqlStatement) -> AppResult<QueryResult>;
}

/// Secure-connection factory producing the process pool.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &DatabaseSettings) -> AppResult<Arc<dyn QueryBackend>>;
}

/// Holds the lazily constructed process-wide pool.
pub struct PoolManager {
    settings: DatabaseSettings,
    connector: Arc<dyn Connector>,
    pool: OnceCell<Arc<dyn QueryBackend>>,
}

impl PoolManager {
    /// Creates a manager; no connection is attempted until [`Self::get_pool`].
    pub fn new(settings: DatabaseSettings, connector: Arc<dyn Connector>) -> Self {
        Self {
            settings,
            connector,
            pool: OnceCell::new(),
        }
    }

    /// Returns the process pool, building it on first use.
    ///
    /// Concurrent first callers wait on the same initialization. A connector
    /// failure is returned to the caller and leaves the manager empty.
    pub async fn get_pool(&self) -> AppResult<Arc<dyn QueryBackend>> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!(
                    instance = %self.settings.instance_uri(),
                    database = %self.settings.database,
                    user = %self.settings.user,
                    "创建数据库连接池"
                );
                self.connector.connect(&self.settings).await
            })
            .await
            .map(Arc::clone)
    }

    /// Whether the pool has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }
}

/// Connects to AlloyDB through its auth proxy endpoint with sqlx.
pub struct PgConnector {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, settings: &DatabaseSettings) -> AppResult<Arc<dyn QueryBackend>> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
            .application_name(APPLICATION_NAME);

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        let backend: Arc<dyn QueryBackend> = Arc::new(PgBackend { pool });
        Ok(backend)
    }
}

/// sqlx Postgres pool behind [`QueryBackend`].
pub struct PgBackend {
    pool: PgPool,
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn run(&self, statement: &SqlStatement) -> AppResult<QueryResult> {
        let start = Instant::now();

        // Dropping `tx` on any early return rolls back and releases the connection.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        let mut query = sqlx::query(&statement.text);
        for value in &statement.binds {
            query = query.bind(value.as_str());
        }

        let rows: Vec<PgRow> = query
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        let columns = rows.first().map(column_info).unwrap_or_default();
        let data = rows.iter().map(row_values).collect();

        let mut result = QueryResult::from_rows(columns, data);
        result.execution_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
