//! # Wayfarer Core
//!
//! The text pipeline of the Wayfarer command framework.
//!
//! This crate has no async runtime. It turns raw message text into typed
//! command arguments:
//!
//! - **Tokenizer**: quote-aware splitting ([`tokenize`], [`Tokens`], [`for_each_token`])
//! - **Grammar compiler**: `"[user:user] [*message:string]"` into a [`CompiledSchema`]
//! - **Schema cache**: compiled grammars shared by source string ([`SchemaCache`])
//! - **Matcher**: tokens against a schema ([`match_arguments`], [`resolve`])
//! - **Platform boundary**: the [`MessageEvent`] trait clients implement
//!
//! ```text
//! raw text ──▶ tokenize ──▶ tokens ──▶ match_arguments ──▶ ArgumentMap
//!                                          ▲
//!              grammar ──▶ compile ──▶ CompiledSchema
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wayfarer_core::{compile, match_arguments, tokenize, ArgumentValue, CoercionCache};
//!
//! let schema = compile("ping", "[user:user] [*message:string]").unwrap();
//! let tokens = tokenize("<@99> hi there");
//! let args = match_arguments(&tokens, &schema, &mut CoercionCache::new()).unwrap();
//!
//! assert_eq!(args["user"], ArgumentValue::User(99));
//! assert_eq!(args["message"], ArgumentValue::Text("hi there".into()));
//! ```

pub mod error;
pub mod event;
pub mod matcher;
pub mod schema;
pub mod tokenizer;
pub mod value;

pub use error::{SchemaError, SchemaErrorKind, SchemaResult};
pub use event::{Author, BoxedMessage, MessageEvent, Origin, TextMessage};
pub use matcher::{
    ArgumentMap, CoercionCache, Mismatch, MismatchReason, ResolvedSchema, match_arguments, resolve,
};
pub use schema::{
    ArgumentSlot, ArgumentType, CompiledSchema, IDENTIFIER_PREFIX, SchemaCache, compile,
};
pub use tokenizer::{Tokens, for_each_token, tokenize};
pub use value::{ArgumentValue, MessageLink};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        ArgumentType, ArgumentValue, Author, BoxedMessage, CompiledSchema, MessageEvent,
        MessageLink, Origin, ResolvedSchema, TextMessage,
    };
}
