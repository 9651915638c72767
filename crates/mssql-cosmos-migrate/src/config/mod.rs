//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::cursor::MigrationMode;
use crate::driver::DriverSettings;
use crate::error::Result;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Build the driver settings from the validated configuration.
    pub fn driver_settings(&self) -> DriverSettings {
        DriverSettings {
            table: self.source.table.clone(),
            primary_key: self.source.primary_key.clone(),
            mode: self.migration.mode(),
            throttle_cooldown: Duration::from_secs(self.migration.throttle_cooldown_secs),
            idle_cooldown: Duration::from_secs(self.migration.idle_cooldown_secs),
        }
    }
}

impl MigrationConfig {
    /// Migration mode selected by this configuration.
    pub fn mode(&self) -> MigrationMode {
        if self.delete_after_migrate {
            MigrationMode::DeleteAfterMigrate
        } else {
            MigrationMode::AdvanceOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_YAML: &str = r#"
source:
  host: localhost
  database: legacy
  user: sa
  password: secret
  table: dbo.Orders
  primary_key: OrderId
target:
  endpoint: https://myaccount.documents.azure.com
  key: dG9wc2VjcmV0bWFzdGVya2V5
  database: appdb
  container: records
"#;

    #[test]
    fn test_minimal_yaml_applies_defaults() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.source.port, 1433);
        assert_eq!(config.source.max_connections, 3);
        assert!(config.source.encrypt);
        assert!(!config.migration.delete_after_migrate);
        assert_eq!(config.migration.throttle_cooldown_secs, 10);
        assert_eq!(config.migration.idle_cooldown_secs, 600);
        assert_eq!(config.target.request_timeout_secs, 30);
    }

    #[test]
    fn test_mode_selection() {
        let mut config = Config::from_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.migration.mode(), MigrationMode::AdvanceOnly);
        config.migration.delete_after_migrate = true;
        assert_eq!(config.migration.mode(), MigrationMode::DeleteAfterMigrate);
    }

    #[test]
    fn test_driver_settings_from_config() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        let settings = config.driver_settings();
        assert_eq!(settings.table, "dbo.Orders");
        assert_eq!(settings.primary_key, "OrderId");
        assert_eq!(settings.throttle_cooldown, Duration::from_secs(10));
        assert_eq!(settings.idle_cooldown, Duration::from_secs(600));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_YAML.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.database, "legacy");
    }

    #[test]
    fn test_missing_required_field_is_config_error() {
        let yaml = r#"
source:
  host: localhost
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }
}
