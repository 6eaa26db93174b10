//! Error types for the Wayfarer core.
//!
//! Only grammar compilation can fail here. Argument matching reports a
//! [`Mismatch`](crate::matcher::Mismatch) value instead, which is an ordinary
//! outcome and not an error.

use thiserror::Error;

/// A grammar string could not be compiled.
///
/// Always names the command that owns the grammar so registration failures
/// can be traced back to their source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot compile grammar for command '{command}': {kind}")]
pub struct SchemaError {
    /// Name of the command declaring the grammar.
    pub command: String,
    /// What was wrong with it.
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub fn new(command: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            command: command.into(),
            kind,
        }
    }
}

/// The specific reason a grammar was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaErrorKind {
    #[error("'[' at position {position} opens a slot inside another slot")]
    NestedBracket { position: usize },

    #[error("']' at position {position} has no matching '['")]
    UnmatchedClose { position: usize },

    #[error("'[' at position {position} is never closed")]
    UnclosedBracket { position: usize },

    #[error("':' at position {position} may only separate a slot name from its type")]
    MisplacedColon { position: usize },

    #[error("slot '{name}' does not declare a type")]
    MissingType { name: String },

    #[error("slot at position {position} has an empty name")]
    EmptyName { position: usize },

    #[error("slot '{name}' uses unknown type '{type_name}'")]
    UnknownType { name: String, type_name: String },

    #[error("slot '{name}' cannot request the reserved type '{type_name}'")]
    ReservedType { name: String, type_name: String },

    #[error("slot '{name}' is variadic, but '{existing}' already is")]
    MultipleVariadic { name: String, existing: String },

    #[error("variadic slot '{name}' must be of type 'string'")]
    VariadicNotText { name: String },

    #[error("slot '{name}' is declared after the variadic slot '{variadic}'")]
    SlotAfterVariadic { name: String, variadic: String },

    #[error("double space at position {position}")]
    DoubleSpace { position: usize },

    #[error("leading or trailing space at position {position}")]
    StraySeparator { position: usize },

    #[error("missing space before position {position}")]
    MissingSeparator { position: usize },

    #[error("slot '{name}' is declared more than once")]
    DuplicateSlot { name: String },

    #[error("no slot could be decoded")]
    NoSlots,
}

/// Result type for grammar compilation.
pub type SchemaResult<T> = Result<T, SchemaError>;
