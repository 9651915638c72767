//! # mssql-cosmos-migrate
//!
//! Continuous single-row migration from SQL Server to an Azure Cosmos DB
//! compatible document store.
//!
//! The library drives a strictly sequential fetch -> transform -> upsert ->
//! acknowledge cycle:
//!
//! - **One row in flight** at any time, read by offset in primary-key order
//! - **Idempotent upserts** keyed by the source primary key, so retries and
//!   restarts tolerate already-written documents
//! - **Delete-after-migrate** mode that drains the source table, or
//!   **advance-only** mode that walks it by offset
//! - **Fixed-interval retry policy** driven by sink response classification
//!   (throttling, conflicts, oversized rows)
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_cosmos_migrate::{Config, CosmosSink, MigrationDriver, MssqlSource};
//!
//! #[tokio::main]
//! async fn main() -> mssql_cosmos_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let source = MssqlSource::new(config.source.clone()).await?;
//!     let sink = CosmosSink::new(&config.target)?;
//!     let driver = MigrationDriver::new(source, sink, config.driver_settings());
//!     // Runs until a fatal condition surfaces; Ok is never returned.
//!     driver.run().await
//! }
//! ```

pub mod classify;
pub mod config;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use classify::Outcome;
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use cursor::{Cursor, MigrationMode};
pub use driver::{CycleOutcome, DriverSettings, DriverStats, MigrationDriver};
pub use error::{MigrateError, Result};
pub use source::{Document, MssqlSource, Row, RowSource, SqlValue};
pub use target::{CosmosSink, DocumentSink, SinkResponse};
