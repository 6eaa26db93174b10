//! # Wayfarer Framework
//!
//! Command registration and dispatch on top of `wayfarer-core`.
//!
//! This layer provides:
//! - Command descriptors with grammars, interceptors and a static store ([`Command`])
//! - A registry that keeps name-length bounds for cheap rejection ([`CommandRegistry`])
//! - The dispatch state machine ([`Dispatcher`], [`DispatchOutcome`])
//! - Middleware and afterware chains ([`Middleware`], [`Afterware`], [`StopSignal`])
//! - Subcommand routing from inside a handler ([`SubcommandRouter`])
//! - Filtering and prefix resolution ([`DispatchSettings`], [`PrefixResolver`])
//!
//! Handlers, middleware, afterware, routes and prefix resolvers are all
//! implemented for plain async closures.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod interceptor;
pub mod registry;
pub mod router;
pub mod settings;
pub mod store;

pub use command::{Command, CommandBuilder};
pub use context::CommandContext;
pub use dispatcher::{DispatchOutcome, DispatchStage, Dispatcher, DispatcherBuilder, DropReason};
pub use error::{BoxError, HandlerResult, RegisterError, RegisterResult, StoreError, StoreResult};
pub use handler::{BoxedHandler, CommandHandler, HandlerResponse};
pub use interceptor::{Afterware, BoxedAfterware, BoxedMiddleware, Middleware, StopSignal};
pub use registry::{CommandRegistry, NameBounds, RegistrySnapshot};
pub use router::{Route, SubcommandRouter};
pub use settings::{
    DEFAULT_PREFIX, DispatchSettings, FilterReason, PrefixResolver, ServerPrefixes, StaticPrefix,
};
pub use store::{Store, StoreValue};
