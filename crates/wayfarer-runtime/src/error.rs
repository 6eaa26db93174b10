//! Runtime error types.

use thiserror::Error;
use wayfarer_framework::RegisterError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A command could not be registered.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// The runtime no longer accepts messages.
    #[error("Runtime is shut down")]
    ShutDown,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
