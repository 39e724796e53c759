//! Configuration validation.

use super::Config;
use crate::core::identifier::{validate_cql_identifier, validate_identifier};
use crate::error::{Result, SetupError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(SetupError::Config("source.host is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(SetupError::Config("source.user is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(SetupError::Config("source.database is required".into()));
    }
    validate_identifier(&config.source.database)?;

    // Target validation
    if config.target.host.is_empty() {
        return Err(SetupError::Config("target.host is required".into()));
    }
    if config.target.bridge_host.is_empty() {
        return Err(SetupError::Config("target.bridge_host is required".into()));
    }
    // Keyspace and bridge table names reach ScyllaDB unquoted
    validate_cql_identifier(&config.target.keyspace)?;

    // Mirror validation
    validate_identifier(&config.mirror.database)?;
    if config.mirror.database == config.source.database {
        return Err(SetupError::Config(
            "mirror.database must differ from source.database".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MirrorConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                host: "127.0.0.1".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: "rootpassword".to_string(),
                database: "testdb".to_string(),
            },
            target: TargetConfig {
                host: "localhost".to_string(),
                port: 9042,
                user: None,
                password: None,
                keyspace: "migration".to_string(),
                bridge_host: "scylladb-migration-target".to_string(),
            },
            mirror: MirrorConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_database() {
        let mut config = valid_config();
        config.source.database = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_mirror_database_must_differ() {
        let mut config = valid_config();
        config.mirror.database = "testdb".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_keyspace_rejected() {
        let mut config = valid_config();
        config.target.keyspace = "bad keyspace".to_string();
        assert!(validate(&config).is_err());
    }
}
