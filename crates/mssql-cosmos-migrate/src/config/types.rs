//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MSSQL).
    pub source: SourceConfig,

    /// Target document store configuration (Cosmos DB).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (MSSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 1433).
    #[serde(default = "default_mssql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Table to migrate (optionally schema-qualified, e.g. "dbo.Orders").
    pub table: String,

    /// Primary-key column used for ordering, document ids and deletes.
    pub primary_key: String,

    /// Encrypt connection (default: true).
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// Trust server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,

    /// Connection pool size (default: 3). The driver keeps exactly one
    /// query in flight, so this stays small.
    #[serde(default = "default_pool_size")]
    pub max_connections: u32,
}

/// Target document store (Cosmos DB) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Account endpoint, e.g. "https://myaccount.documents.azure.com".
    pub endpoint: String,

    /// Base64-encoded master key.
    pub key: String,

    /// Database name.
    pub database: String,

    /// Container (collection) name.
    pub container: String,

    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Delete each source row after a confirmed upsert (default: false).
    /// When false the cursor advances past migrated rows instead.
    #[serde(default)]
    pub delete_after_migrate: bool,

    /// Cooldown after a rate-limited upsert, in seconds (default: 10).
    #[serde(default = "default_throttle_cooldown")]
    pub throttle_cooldown_secs: u64,

    /// Cooldown when the source has no rows left, in seconds (default: 600).
    #[serde(default = "default_idle_cooldown")]
    pub idle_cooldown_secs: u64,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            delete_after_migrate: false,
            throttle_cooldown_secs: default_throttle_cooldown(),
            idle_cooldown_secs: default_idle_cooldown(),
        }
    }
}

// Passwords and keys must never leak through Debug-formatted logs.

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("database", &self.database)
            .field("container", &self.container)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

// Default value functions for serde

fn default_mssql_port() -> u16 {
    1433
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_throttle_cooldown() -> u64 {
    10
}

fn default_idle_cooldown() -> u64 {
    600
}
