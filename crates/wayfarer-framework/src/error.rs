//! Error types for the Wayfarer framework.

use thiserror::Error;
use wayfarer_core::SchemaError;

/// Error type returned by handlers, middleware and afterware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for user-supplied command code.
pub type HandlerResult<T = ()> = Result<T, BoxError>;

/// Errors raised while registering a command.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// One of the command's grammars does not compile.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A command with the same name is already registered.
    #[error("command '{name}' is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// The command name is empty.
    #[error("command name must not be empty")]
    EmptyName,

    /// The command name contains whitespace and could never be typed as one token.
    #[error("command name '{name}' must not contain whitespace")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

/// Result type for registration.
pub type RegisterResult<T> = Result<T, RegisterError>;

/// Errors returned by typed [`Store`](crate::store::Store) reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Nothing is stored under the key.
    #[error("no value stored under '{key}'")]
    Absent {
        /// The requested key.
        key: String,
    },

    /// The key holds a value of another kind.
    #[error("value under '{key}' is {found}, not {expected}")]
    WrongKind {
        /// The requested key.
        key: String,
        /// Kind the caller asked for.
        expected: &'static str,
        /// Kind actually stored.
        found: &'static str,
    },
}

impl StoreError {
    pub fn absent(key: impl Into<String>) -> Self {
        Self::Absent { key: key.into() }
    }

    pub fn wrong_kind(key: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::WrongKind {
            key: key.into(),
            expected,
            found,
        }
    }
}

/// Result type for store reads.
pub type StoreResult<T> = Result<T, StoreError>;
