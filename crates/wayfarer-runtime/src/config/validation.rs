//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, LogOutput, LoggingConfig, WayfarerConfig, parse_server_id};

/// Validates the entire configuration.
pub fn validate_config(config: &WayfarerConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_dispatch_config(&config.dispatch)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(path) = &logging.file_path
        && path.file_name().is_none()
    {
        return Err(ConfigError::validation(format!(
            "Log file path has no file name: {}",
            path.display()
        )));
    }
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        tracing::warn!("File log output configured without logging.file_path, stdout will be used");
    }
    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    validate_prefix("dispatch.prefix", &dispatch.prefix)?;

    for (server, prefix) in &dispatch.server_prefixes {
        parse_server_id(server)?;
        validate_prefix(&format!("dispatch.server_prefixes.{server}"), prefix)?;
    }

    Ok(())
}

/// A prefix is matched against the first token, so it can neither be empty
/// nor contain whitespace.
fn validate_prefix(field: &str, prefix: &str) -> ConfigResult<()> {
    if prefix.is_empty() {
        return Err(ConfigError::validation(format!("{field} must not be empty")));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "{field} must not contain whitespace: {prefix:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WayfarerConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_prefixes() {
        let mut config = WayfarerConfig::default();
        config.dispatch.prefix = String::new();
        assert!(matches!(validate_config(&config), Err(ConfigError::Validation { .. })));

        config.dispatch.prefix = "! ".into();
        assert!(matches!(validate_config(&config), Err(ConfigError::Validation { .. })));

        config.dispatch.prefix = "!".into();
        config.dispatch.server_prefixes.insert("42".into(), "a b".into());
        assert!(matches!(validate_config(&config), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_non_numeric_server() {
        let mut config = WayfarerConfig::default();
        config.dispatch.server_prefixes.insert("main".into(), "?".into());
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidServerId(_))));
    }

    #[test]
    fn test_rejects_log_path_without_file_name() {
        let mut config = WayfarerConfig::default();
        config.logging.file_path = Some(PathBuf::from("/"));
        assert!(validate_config(&config).is_err());
    }
}
