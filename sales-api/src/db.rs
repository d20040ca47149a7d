//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! [`QueryExecutor`] implementation the report pipeline runs on.
//!
//! Statements are prepared once per connection (`prepare_cached`) and every
//! parameter is bound positionally. Nothing is ever interpolated into SQL.

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime, Timeouts,
};
use sales_core::{QueryExecutor, QueryParams, ReportError, ReportResult, Row, SqlValue, Statement};
use std::time::{Duration, Instant};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::NoTls;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create timeout for pool checkouts
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost:5432/sales".to_string(),
            max_size: 10,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// - `DATABASE_URL`: connection URL
    /// - `SALES_DB_POOL_SIZE`: maximum connections (default: 10)
    /// - `SALES_DB_TIMEOUT`: checkout timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_size: std::env::var("SALES_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("SALES_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily; an unreachable server surfaces on the
    /// first checkout, not here.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.url = Some(self.url.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pool_error(err: PoolError) -> ReportError {
    match err {
        PoolError::Timeout(_) => ReportError::PoolExhausted,
        PoolError::Closed => ReportError::Unavailable {
            reason: "connection pool is closed".to_string(),
        },
        PoolError::Backend(e) => ReportError::Unavailable {
            reason: e.to_string(),
        },
        other => ReportError::Unavailable {
            reason: other.to_string(),
        },
    }
}

fn query_error(err: tokio_postgres::Error) -> ReportError {
    match err.as_db_error() {
        Some(db) => ReportError::query(format!("{} ({})", db.message(), db.code().code())),
        None if err.is_closed() => ReportError::Unavailable {
            reason: err.to_string(),
        },
        None => ReportError::query(err.to_string()),
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

/// Decode one column into a [`SqlValue`].
fn decode_column(row: &tokio_postgres::Row, idx: usize, name: &str, ty: &Type) -> ReportResult<SqlValue> {
    let shape = |e: tokio_postgres::Error| ReportError::row_shape(name, e.to_string());

    let value: SqlValue = if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).map_err(shape)?.into()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx).map_err(shape)?.map(i64::from).into()
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx).map_err(shape)?.map(i64::from).into()
    } else if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx).map_err(shape)?.into()
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx).map_err(shape)?.into()
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx).map_err(shape)?.map(f64::from).into()
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME {
        row.try_get::<_, Option<String>>(idx).map_err(shape)?.into()
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<chrono::NaiveDate>>(idx).map_err(shape)?.into()
    } else {
        return Err(ReportError::row_shape(name, format!("unsupported column type {}", ty)));
    };

    Ok(value)
}

fn decode_row(row: &tokio_postgres::Row) -> ReportResult<Row> {
    let mut decoded = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.name(), column.type_())?;
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Pool-backed query executor.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Close the pool. Later checkouts fail with "unavailable".
    pub fn close(&self) {
        self.pool.close();
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ReportResult<deadpool_postgres::Object> {
        let conn = self.pool.get().await.map_err(pool_error)?;
        if let Some(metrics) = metrics() {
            metrics.set_pool_connections(self.pool_size());
        }
        Ok(conn)
    }

    async fn run(&self, statement: &Statement, params: &QueryParams) -> ReportResult<Vec<Row>> {
        let bound = statement.bind(params)?;
        let args: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|value| *value as &(dyn ToSql + Sync))
            .collect();

        let conn = self.get_conn().await?;
        let prepared = conn.prepare_cached(statement.sql()).await.map_err(query_error)?;
        let rows = conn.query(&prepared, &args).await.map_err(query_error)?;

        rows.iter().map(decode_row).collect()
    }
}

#[async_trait]
impl QueryExecutor for DbClient {
    async fn execute(&self, statement: &Statement, params: &QueryParams) -> ReportResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.run(statement, params).await;
        let elapsed = start.elapsed();

        if let Some(metrics) = metrics() {
            metrics.record_report_query(statement.name(), result.is_ok(), elapsed.as_secs_f64());
        }

        match &result {
            Ok(rows) => tracing::debug!(
                statement = statement.name(),
                rows = rows.len(),
                duration_ms = elapsed.as_millis() as u64,
                "Report query executed"
            ),
            Err(e) => tracing::warn!(
                statement = statement.name(),
                error = %e,
                duration_ms = elapsed.as_millis() as u64,
                "Report query failed"
            ),
        }

        result
    }

    async fn ping(&self) -> ReportResult<()> {
        let conn = self.get_conn().await?;

        // Simple query to verify connectivity
        conn.query_one("SELECT 1", &[]).await.map_err(query_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.max_size, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.url.starts_with("postgres://"));
    }

    #[test]
    fn test_pool_error_mapping() {
        assert_eq!(
            pool_error(PoolError::Closed),
            ReportError::Unavailable {
                reason: "connection pool is closed".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() -> Result<(), String> {
        let config = DbConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            max_size: 1,
            timeout: Duration::from_millis(200),
        };
        let client = DbClient::from_config(&config).map_err(|e| e.message)?;
        assert_eq!(client.pool_size(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() -> Result<(), String> {
        let client = DbClient::from_config(&DbConfig::default()).map_err(|e| e.message)?;
        client.close();
        let err = client.ping().await.unwrap_err();
        assert!(matches!(err, ReportError::Unavailable { .. }));
        Ok(())
    }
}
