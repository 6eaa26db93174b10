//! The grammar mini-language: types, compiler and cache.

pub mod cache;
pub mod compiler;
pub mod types;

pub use cache::SchemaCache;
pub use compiler::compile;
pub use types::{ArgumentSlot, ArgumentType, CompiledSchema, IDENTIFIER_PREFIX};
