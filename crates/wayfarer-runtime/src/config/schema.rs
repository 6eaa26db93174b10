//! Configuration schema.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//! output = "stdout"
//!
//! [dispatch]
//! prefix = "%"
//! ignored_users = [1234]
//!
//! [dispatch.server_prefixes]
//! "42" = "!"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wayfarer_framework::{DEFAULT_PREFIX, DispatchSettings, ServerPrefixes};

use super::error::{ConfigError, ConfigResult};

/// Root of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WayfarerConfig {
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEventConfig,
    /// Show thread ids next to each record.
    pub thread_ids: bool,
    /// Show source file and line.
    pub file_location: bool,
    /// Target file when `output = "file"`.
    pub file_path: Option<PathBuf>,
    /// Per-target levels, e.g. `wayfarer_framework = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            filters: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

// =============================================================================
// Dispatch
// =============================================================================

/// `[dispatch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Prefix used where no server override applies.
    pub prefix: String,
    pub ignore_private: bool,
    pub ignore_servers: bool,
    pub ignored_users: Vec<u64>,
    pub ignored_servers: Vec<u64>,
    /// Prefix overrides keyed by server id.
    pub server_prefixes: HashMap<String, String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            ignore_private: false,
            ignore_servers: false,
            ignored_users: Vec::new(),
            ignored_servers: Vec::new(),
            server_prefixes: HashMap::new(),
        }
    }
}

impl DispatchConfig {
    /// The filtering part of this section.
    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings {
            ignore_private: self.ignore_private,
            ignore_servers: self.ignore_servers,
            ignored_users: self.ignored_users.iter().copied().collect(),
            ignored_servers: self.ignored_servers.iter().copied().collect(),
        }
    }

    /// Builds the prefix resolver, parsing the server ids of the overrides.
    pub fn prefixes(&self) -> ConfigResult<ServerPrefixes> {
        self.server_prefixes
            .iter()
            .try_fold(ServerPrefixes::new(self.prefix.as_str()), |prefixes, (server, prefix)| {
                let id = parse_server_id(server)?;
                Ok(prefixes.with_override(id, prefix.as_str()))
            })
    }
}

pub(crate) fn parse_server_id(raw: &str) -> ConfigResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid_server_id(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::{Author, Origin};
    use wayfarer_framework::FilterReason;

    #[test]
    fn test_defaults() {
        let config = WayfarerConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.dispatch.prefix, "%");
    }

    #[test]
    fn test_settings_conversion() {
        let dispatch = DispatchConfig {
            ignored_users: vec![3],
            ignored_servers: vec![8],
            ..Default::default()
        };
        let settings = dispatch.settings();
        assert_eq!(settings.filter(Author::user(3), Origin::Private), Err(FilterReason::IgnoredUser));
        assert_eq!(settings.filter(Author::user(1), Origin::Server(8)), Err(FilterReason::IgnoredServer));
    }

    #[test]
    fn test_prefixes_conversion() {
        let mut dispatch = DispatchConfig {
            prefix: "!".into(),
            ..Default::default()
        };
        dispatch.server_prefixes.insert("42".into(), "?".into());

        let prefixes = dispatch.prefixes().unwrap();
        assert_eq!(prefixes.lookup(Some(42)), "?");
        assert_eq!(prefixes.lookup(Some(1)), "!");
        assert_eq!(prefixes.lookup(None), "!");

        dispatch.server_prefixes.insert("guild".into(), "?".into());
        assert!(matches!(dispatch.prefixes(), Err(ConfigError::InvalidServerId(id)) if id == "guild"));
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
