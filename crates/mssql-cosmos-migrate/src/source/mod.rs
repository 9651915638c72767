//! MSSQL source database operations.

mod types;

pub use types::*;

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use std::time::{Duration, Instant};
use tiberius::{AuthMethod, Client, ColumnType, Config, EncryptionLevel, Query, Row as TdsRow};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

/// Trait for source database operations.
///
/// Adapters only execute and report; retry policy lives in the driver.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Read the single row at `offset` in primary-key order.
    ///
    /// Offset 0 reads the first row in the table's natural order; any other
    /// offset skips that many rows in stable key order. Returns `None` when
    /// the source is exhausted. Must not mutate source state.
    async fn fetch_next(&self, offset: i64) -> Result<Option<Row>>;

    /// Delete at most one row matching the primary-key value.
    /// Returns the number of rows affected.
    async fn delete_row(&self, pk: &SqlValue) -> Result<u64>;

    /// Round-trip the connection, returning the observed latency.
    async fn ping(&self) -> Result<Duration>;
}

/// Connection manager for bb8 pool with tiberius.
#[derive(Clone)]
struct TiberiusConnectionManager {
    config: SourceConfig,
}

impl TiberiusConnectionManager {
    fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(&self.config.user, &self.config.password));

        if self.config.encrypt {
            if self.config.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }

        config
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;

        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// MSSQL source implementation with connection pooling.
///
/// The pool is intentionally small: the driver keeps one query in flight at
/// a time, and the process holds its connections for its entire lifetime.
pub struct MssqlSource {
    pool: Pool<TiberiusConnectionManager>,
    table_ref: String,
    pk_ref: String,
}

impl MssqlSource {
    /// Connect and verify the source, taking the pool size from the config.
    pub async fn new(config: SourceConfig) -> Result<Self> {
        let table_ref = qualify_table(&config.table);
        let pk_ref = quote_ident(&config.primary_key);
        let max_size = config.max_connections;

        let manager = TiberiusConnectionManager::new(config.clone());
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(1))
            .build(manager)
            .await
            .map_err(|e| MigrateError::Pool(format!("Failed to create MSSQL pool: {}", e)))?;

        // Test connection
        {
            let mut conn = pool
                .get()
                .await
                .map_err(|e| MigrateError::Pool(format!("Failed to get connection: {}", e)))?;

            conn.simple_query("SELECT 1").await?.into_row().await?;
        }

        info!(
            "Connected to MSSQL: {}:{}/{} (table={}, pool_size={})",
            config.host, config.port, config.database, config.table, max_size
        );

        Ok(Self {
            pool,
            table_ref,
            pk_ref,
        })
    }

    /// Get a pooled connection.
    async fn get_client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::Pool(format!("Failed to get connection: {}", e)))
    }
}

#[async_trait]
impl RowSource for MssqlSource {
    async fn fetch_next(&self, offset: i64) -> Result<Option<Row>> {
        let mut client = self.get_client().await?;

        let rows = if offset == 0 {
            // No paging required for the head of the table
            let query = format!("SELECT TOP (1) * FROM {}", self.table_ref);
            client
                .simple_query(&query)
                .await?
                .into_first_result()
                .await?
        } else {
            let sql = format!(
                "SELECT * FROM {} ORDER BY {} OFFSET @P1 ROWS FETCH NEXT 1 ROWS ONLY",
                self.table_ref, self.pk_ref
            );
            let mut query = Query::new(sql);
            query.bind(offset);
            query.query(&mut client).await?.into_first_result().await?
        };

        debug!(offset, found = !rows.is_empty(), "fetched next row");
        Ok(rows.first().map(convert_row))
    }

    async fn delete_row(&self, pk: &SqlValue) -> Result<u64> {
        let mut client = self.get_client().await?;

        // TOP (1) bounds the delete to a single row even under non-unique keys
        let sql = format!(
            "DELETE TOP (1) FROM {} WHERE {} = @P1",
            self.table_ref, self.pk_ref
        );
        let mut query = Query::new(sql);
        bind_value(&mut query, pk);

        let result = query.execute(&mut client).await?;
        let affected: u64 = result.rows_affected().iter().copied().sum();

        debug!(?pk, affected, "deleted source row");
        Ok(affected)
    }

    async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        let mut client = self.get_client().await?;
        client.simple_query("SELECT 1").await?.into_row().await?;
        Ok(start.elapsed())
    }
}

/// Convert a tiberius row into the adapter's owned representation.
fn convert_row(row: &TdsRow) -> Row {
    let meta: Vec<(String, ColumnType)> = row
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.column_type()))
        .collect();

    let mut columns = Vec::with_capacity(meta.len());
    for (idx, (name, column_type)) in meta.into_iter().enumerate() {
        columns.push((name, convert_value(row, idx, column_type)));
    }
    Row::new(columns)
}

/// Convert one column value based on its wire type.
fn convert_value(row: &TdsRow, idx: usize, column_type: ColumnType) -> SqlValue {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => row
            .try_get::<bool, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::Bool)
            .unwrap_or(SqlValue::Null),
        ColumnType::Int1 => row
            .try_get::<u8, _>(idx)
            .ok()
            .flatten()
            .map(|v| SqlValue::I16(v as i16))
            .unwrap_or(SqlValue::Null),
        ColumnType::Int2 => row
            .try_get::<i16, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::I16)
            .unwrap_or(SqlValue::Null),
        ColumnType::Int4 => row
            .try_get::<i32, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::I32)
            .unwrap_or(SqlValue::Null),
        ColumnType::Int8 => row
            .try_get::<i64, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::I64)
            .unwrap_or(SqlValue::Null),
        // Intn carries whichever width the column actually has
        ColumnType::Intn => row
            .try_get::<i64, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::I64)
            .or_else(|| row.try_get::<i32, _>(idx).ok().flatten().map(SqlValue::I32))
            .or_else(|| row.try_get::<i16, _>(idx).ok().flatten().map(SqlValue::I16))
            .or_else(|| {
                row.try_get::<u8, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| SqlValue::I16(v as i16))
            })
            .unwrap_or(SqlValue::Null),
        ColumnType::Float4 => row
            .try_get::<f32, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::F32)
            .unwrap_or(SqlValue::Null),
        ColumnType::Float8 | ColumnType::Money | ColumnType::Money4 => row
            .try_get::<f64, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::F64)
            .unwrap_or(SqlValue::Null),
        ColumnType::Floatn => row
            .try_get::<f64, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::F64)
            .or_else(|| row.try_get::<f32, _>(idx).ok().flatten().map(SqlValue::F32))
            .unwrap_or(SqlValue::Null),
        ColumnType::Guid => row
            .try_get::<uuid::Uuid, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::Uuid)
            .unwrap_or(SqlValue::Null),
        ColumnType::Decimaln | ColumnType::Numericn => row
            .try_get::<rust_decimal::Decimal, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::Decimal)
            .unwrap_or(SqlValue::Null),
        ColumnType::Datetime
        | ColumnType::Datetime2
        | ColumnType::Datetimen
        | ColumnType::Datetime4 => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::DateTime)
            .unwrap_or(SqlValue::Null),
        ColumnType::Daten => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Null),
        ColumnType::Timen => row
            .try_get::<chrono::NaiveTime, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Null),
        ColumnType::DatetimeOffsetn => row
            .try_get::<chrono::DateTime<chrono::FixedOffset>, _>(idx)
            .ok()
            .flatten()
            .map(SqlValue::DateTimeOffset)
            .unwrap_or(SqlValue::Null),
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => row
            .try_get::<&[u8], _>(idx)
            .ok()
            .flatten()
            .map(|v| SqlValue::Bytes(v.to_vec()))
            .unwrap_or(SqlValue::Null),
        // Covers varchar, nvarchar, char, nchar, text, ntext, xml, etc.
        _ => row
            .try_get::<&str, _>(idx)
            .ok()
            .flatten()
            .map(|s| SqlValue::String(s.to_string()))
            .unwrap_or(SqlValue::Null),
    }
}

/// Bind a typed value as a query parameter.
fn bind_value<'a>(query: &mut Query<'a>, value: &'a SqlValue) {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::I16(v) => query.bind(*v),
        SqlValue::I32(v) => query.bind(*v),
        SqlValue::I64(v) => query.bind(*v),
        SqlValue::F32(v) => query.bind(*v),
        SqlValue::F64(v) => query.bind(*v),
        SqlValue::String(v) => query.bind(v.as_str()),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
        SqlValue::Uuid(v) => query.bind(*v),
        SqlValue::Decimal(v) => query.bind(tiberius::numeric::Numeric::new_with_scale(
            v.mantissa(),
            v.scale() as u8,
        )),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::DateTimeOffset(v) => query.bind(*v),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Time(v) => query.bind(*v),
    }
}

/// Quote a SQL Server identifier, escaping closing brackets.
///
/// Identifiers cannot be parameterized in prepared statements, so the table
/// and key names are bracket-quoted with embedded `]` doubled to keep
/// dynamic SQL injection-safe.
fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Quote a possibly schema-qualified table name ("dbo.Orders").
fn qualify_table(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}
