//! Configuration for the Wayfarer runtime.
//!
//! Layered loading from defaults, files and `WAYFARER_*` variables, plus
//! validation of the dispatch prefixes.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig, WayfarerConfig,
};
pub use validation::validate_config;
