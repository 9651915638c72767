//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Validate the configuration.
///
/// All parameters the driver needs must be present before its loop starts;
/// anything missing here is a startup-time fatal condition.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user is required".into()));
    }
    if config.source.password.is_empty() {
        return Err(MigrateError::Config("source.password is required".into()));
    }
    if config.source.table.is_empty() {
        return Err(MigrateError::Config("source.table is required".into()));
    }
    if config.source.primary_key.is_empty() {
        return Err(MigrateError::Config("source.primary_key is required".into()));
    }
    if config.source.max_connections == 0 {
        return Err(MigrateError::Config(
            "source.max_connections must be at least 1".into(),
        ));
    }

    // Target validation
    if config.target.endpoint.is_empty() {
        return Err(MigrateError::Config("target.endpoint is required".into()));
    }
    if !config.target.endpoint.starts_with("https://")
        && !config.target.endpoint.starts_with("http://")
    {
        return Err(MigrateError::Config(format!(
            "target.endpoint must be an http(s) URL, got '{}'",
            config.target.endpoint
        )));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.container.is_empty() {
        return Err(MigrateError::Config("target.container is required".into()));
    }
    if STANDARD.decode(&config.target.key).is_err() {
        return Err(MigrateError::Config(
            "target.key must be a base64-encoded master key".into(),
        ));
    }

    // Migration validation
    if config.migration.throttle_cooldown_secs == 0 {
        return Err(MigrateError::Config(
            "migration.throttle_cooldown_secs must be at least 1".into(),
        ));
    }
    if config.migration.idle_cooldown_secs == 0 {
        return Err(MigrateError::Config(
            "migration.idle_cooldown_secs must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                host: "localhost".to_string(),
                port: 1433,
                database: "source_db".to_string(),
                user: "sa".to_string(),
                password: "password".to_string(),
                table: "dbo.Orders".to_string(),
                primary_key: "OrderId".to_string(),
                encrypt: false,
                trust_server_cert: true,
                max_connections: 3,
            },
            target: TargetConfig {
                endpoint: "https://myaccount.documents.azure.com".to_string(),
                key: "dG9wc2VjcmV0bWFzdGVya2V5".to_string(),
                database: "appdb".to_string(),
                container: "records".to_string(),
                request_timeout_secs: 30,
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_source_host() {
        let mut config = valid_config();
        config.source.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_password() {
        let mut config = valid_config();
        config.source.password = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_table() {
        let mut config = valid_config();
        config.source.table = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_primary_key() {
        let mut config = valid_config();
        config.source.primary_key = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_endpoint_must_be_url() {
        let mut config = valid_config();
        config.target.endpoint = "myaccount.documents.azure.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_key_must_be_base64() {
        let mut config = valid_config();
        config.target.key = "not base64 at all!!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let mut config = valid_config();
        config.migration.throttle_cooldown_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }

    #[test]
    fn test_target_config_debug_redacts_key() {
        let mut config = valid_config();
        config.target.key = "c3VwZXJzZWNyZXQ=".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("c3VwZXJzZWNyZXQ="),
            "Debug output should not contain actual key value"
        );
    }
}
