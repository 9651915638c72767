//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
///
/// Every variant that reaches the top-level loop is fatal by definition:
/// retryable sink responses (throttling, conflicts, oversized rows) are
/// handled inside the driver and never become errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Sink transport error (connection refused, TLS, timeout)
    #[error("Sink transport error: {0}")]
    SinkTransport(#[from] reqwest::Error),

    /// Sink rejected a request with a status the classifier does not handle
    #[error("Sink rejected request (HTTP {status}): {message}")]
    SinkRejected { status: u16, message: String },

    /// Source delete failed after a confirmed upsert (delete-mode only).
    /// Halting here is deliberate: retrying the cycle would re-upsert the
    /// row, but a source row that cannot be removed would be reprocessed
    /// forever without operator intervention.
    #[error("Delete failed for table {table}: {message}")]
    DeleteFailed { table: String, message: String },

    /// A fetched row does not carry the configured primary-key column
    #[error("Row from {table} is missing primary key column '{column}'")]
    MissingPrimaryKey { table: String, column: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Process exit code for this error.
    ///
    /// The driver never exits zero in normal operation, so the codes only
    /// distinguish fatal causes for the supervising process.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 1,
            MigrateError::Source(_) | MigrateError::Pool(_) => 2,
            MigrateError::SinkTransport(_) | MigrateError::Json(_) => 3,
            MigrateError::SinkRejected { .. } => 4,
            MigrateError::DeleteFailed { .. } => 5,
            MigrateError::MissingPrimaryKey { .. } => 6,
            MigrateError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 1);
        assert_eq!(MigrateError::Pool("x".into()).exit_code(), 2);
        assert_eq!(
            MigrateError::SinkRejected {
                status: 500,
                message: "boom".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(
            MigrateError::DeleteFailed {
                table: "dbo.Users".into(),
                message: "gone".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(
            MigrateError::MissingPrimaryKey {
                table: "dbo.Users".into(),
                column: "Id".into()
            }
            .exit_code(),
            6
        );
        let io = MigrateError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
        assert_eq!(io.exit_code(), 7);
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = MigrateError::SinkRejected {
            status: 500,
            message: "internal server error".into(),
        };
        let detailed = err.format_detailed();
        assert!(detailed.contains("HTTP 500"));
        assert!(detailed.contains("internal server error"));
    }
}
