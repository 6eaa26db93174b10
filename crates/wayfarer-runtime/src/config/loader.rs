//! Layered configuration loading with figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: `wayfarer.toml`, `config.toml`
//! - `yaml-config`: `wayfarer.yaml`, `wayfarer.yml`, `config.yaml`, `config.yml`
//!
//! # Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic values passed to [`ConfigLoader::merge`]
//! 3. Profile-specific file (`wayfarer.{profile}.toml`)
//! 4. Main file (`wayfarer.toml`)
//! 5. Environment variables (`WAYFARER_*`)
//!
//! # Environment Variable Mapping
//!
//! `__` separates nesting levels:
//!
//! - `WAYFARER_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `WAYFARER_DISPATCH__PREFIX=!` → `dispatch.prefix = "!"`
//! - `WAYFARER_DISPATCH__IGNORED_USERS=[1,2]` → `dispatch.ignored_users = [1, 2]`
//!
//! # Example
//!
//! ```rust,ignore
//! use wayfarer_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/wayfarer.toml")
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WayfarerConfig;
use super::validation::validate_config;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "WAYFARER_";

/// Variable that selects the profile.
pub const PROFILE_ENV: &str = "WAYFARER_PROFILE";

/// Configuration profile for environment-specific files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the `dev` and `prod` short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `WAYFARER_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-source configuration loader.
pub struct ConfigLoader {
    /// Programmatic layers.
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Explicit file, skips the search.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<config dir>/wayfarer` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("wayfarer")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `WAYFARER_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers `config` over the built-in defaults.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(WayfarerConfig {
    ///         dispatch: DispatchConfig { prefix: "!".into(), ..Default::default() },
    ///         ..Default::default()
    ///     })
    ///     .load()?;
    /// ```
    pub fn merge(mut self, config: WayfarerConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, extracts and validates the configuration.
    pub fn load(self) -> ConfigResult<WayfarerConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: WayfarerConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            prefix = %config.dispatch.prefix,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(WayfarerConfig::default()));

        let programmatic = std::mem::take(&mut self.figment);
        figment = figment.merge(programmatic);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }

        Ok(figment)
    }

    /// Merges one file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("wayfarer"));
        }
        paths
    }

    /// Walks `search_paths × base_names`, merging a profile-specific file
    /// before its base file. Stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path = search_path.join(format!("{stem}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["wayfarer.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["wayfarer.yaml", "wayfarer.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the current directory and the environment.
pub fn load_config() -> ConfigResult<WayfarerConfig> {
    ConfigLoader::new().with_current_dir().load()
}

/// Loads exactly `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<WayfarerConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::{DispatchConfig, LogLevel};

    fn check(result: ConfigResult<WayfarerConfig>) -> figment::error::Result<WayfarerConfig> {
        result.map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            let config = check(ConfigLoader::new().search_path(jail.directory()).without_env().load())?;
            assert_eq!(config, WayfarerConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "wayfarer.toml",
                r#"
                    [logging]
                    level = "debug"

                    [dispatch]
                    prefix = "!"
                    ignored_users = [7]

                    [dispatch.server_prefixes]
                    "42" = "?"
                "#,
            )?;
            jail.set_env("WAYFARER_DISPATCH__PREFIX", "$");

            let config = check(ConfigLoader::new().search_path(jail.directory()).load())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.dispatch.prefix, "$");
            assert_eq!(config.dispatch.ignored_users, vec![7]);

            let prefixes = config
                .dispatch
                .prefixes()
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(prefixes.lookup(Some(42)), "?");
            assert_eq!(prefixes.lookup(None), "$");
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file("wayfarer.production.toml", "[dispatch]\nprefix = \"p\"\nignore_private = true\n")?;
            jail.create_file("wayfarer.toml", "[dispatch]\nprefix = \"m\"\n")?;

            let config = check(
                ConfigLoader::new()
                    .profile("prod")
                    .search_path(jail.directory())
                    .without_env()
                    .load(),
            )?;
            assert_eq!(config.dispatch.prefix, "m");
            assert!(config.dispatch.ignore_private);
            Ok(())
        });
    }

    #[test]
    fn test_programmatic_merge_is_below_files() {
        Jail::expect_with(|jail| {
            jail.create_file("wayfarer.toml", "[logging]\nlevel = \"warn\"\n")?;
            let config = check(
                ConfigLoader::new()
                    .search_path(jail.directory())
                    .without_env()
                    .merge(WayfarerConfig {
                        dispatch: DispatchConfig {
                            prefix: "?".into(),
                            ..Default::default()
                        },
                        ..Default::default()
                    })
                    .load(),
            )?;
            assert_eq!(config.dispatch.prefix, "?");
            assert_eq!(config.logging.level, LogLevel::Warn);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_errors() {
        Jail::expect_with(|jail| {
            let missing = ConfigLoader::new().file(jail.directory().join("nope.toml")).without_env().load();
            assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

            jail.create_file("wayfarer.ini", "")?;
            let unsupported = ConfigLoader::new().file(jail.directory().join("wayfarer.ini")).without_env().load();
            assert!(matches!(unsupported, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_prefix_fails_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("WAYFARER_DISPATCH__PREFIX", "a b");
            let result = ConfigLoader::new().search_path(jail.directory()).load();
            assert!(matches!(result, Err(ConfigError::Validation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env(PROFILE_ENV, "prod");
            assert_eq!(Profile::from_env(), Profile::Production);
            jail.set_env(PROFILE_ENV, "staging");
            assert_eq!(Profile::from_env(), Profile::Custom("staging".into()));
            Ok(())
        });
    }
}
