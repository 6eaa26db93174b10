//! Wayfarer Runtime - orchestration layer for the Wayfarer command framework.
//!
//! This crate provides:
//! - Layered configuration with figment (`wayfarer.toml`, `WAYFARER_*`)
//! - Logging setup driven by that configuration
//! - [`WayfarerRuntime`], which runs every inbound message as its own task
//!   and shuts down gracefully
//!
//! ```ignore
//! use wayfarer_runtime::WayfarerRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = WayfarerRuntime::builder().build()?;
//!     runtime.register(ping_command())?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     platform::connect(tx).await?;
//!     runtime.run(rx).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, LoggingConfig, WayfarerConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, WayfarerRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// The runtime entry points plus the `tracing` macros.
pub mod prelude {
    pub use super::{RuntimeBuilder, WayfarerConfig, WayfarerRuntime};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
