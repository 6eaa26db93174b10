//! # Wayfarer
//!
//! A prefix-command dispatch framework for chat bots.
//!
//! ## Overview
//!
//! Wayfarer turns message text such as `%ban <@42> spamming again` into a
//! call of a registered command with typed, named arguments. It does no
//! network I/O of its own: a platform client feeds it messages through the
//! [`MessageEvent`](core::MessageEvent) trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────────────────────────┐
//! │   Runtime   │────▶│ Dispatcher (one task per message)     │
//! │ (mpsc feed) │     │  filter → tokenize → identify command │
//! └─────────────┘     │  → resolve grammar → middleware       │
//!                     │  → handler (→ subcommand router)      │
//!                     │  → afterware                          │
//!                     └───────────────────────────────────────┘
//! ```
//!
//! - **Core**: tokenizer, grammar compiler and cache, argument matcher
//! - **Framework**: commands, registry, dispatcher, interceptors, router
//! - **Runtime**: configuration, logging, task tracking and shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wayfarer::prelude::*;
//!
//! async fn greet(ctx: Arc<CommandContext>) {
//!     if let Some(schema) = ctx.schema() {
//!         println!("hello <@{}>", schema.user("target").unwrap_or_default());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = WayfarerRuntime::builder().build()?;
//!     runtime.register(
//!         Command::builder("greet")
//!             .grammar("[target:user]")
//!             .handler(greet)
//!             .build(),
//!     )?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     platform::connect(tx).await?;
//!     runtime.run(rx).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use wayfarer_core as core;
pub use wayfarer_framework as framework;
pub use wayfarer_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use wayfarer::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use wayfarer_runtime::{WayfarerConfig, WayfarerRuntime};

    // Commands and dispatch
    pub use wayfarer_framework::{
        Command, CommandContext, DispatchOutcome, Dispatcher, HandlerResult, StopSignal,
        SubcommandRouter,
    };

    // Messages and arguments
    pub use wayfarer_core::{
        ArgumentType, ArgumentValue, Author, BoxedMessage, MessageEvent, MessageLink, Origin,
        ResolvedSchema, TextMessage,
    };
}
