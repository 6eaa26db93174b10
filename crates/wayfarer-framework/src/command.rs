//! Command descriptors.
//!
//! A [`Command`] bundles everything the dispatcher needs to run one named
//! command: its grammars, interceptors, static store and handler.
//!
//! ```rust,ignore
//! let ping = Command::builder("ping")
//!     .description("Mention someone with a message")
//!     .grammar("user [user:user] [*message:string]")
//!     .grammar("channel [channel:channel]")
//!     .middleware(only_in_servers)
//!     .handler(ping)
//!     .build();
//!
//! dispatcher.register(ping)?;
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use wayfarer_core::CompiledSchema;

use crate::context::CommandContext;
use crate::handler::{BoxedHandler, CommandHandler};
use crate::interceptor::{Afterware, BoxedAfterware, BoxedMiddleware, Middleware};
use crate::router::SubcommandRouter;
use crate::store::{Store, StoreValue};

/// A registered or registrable command.
pub struct Command {
    name: String,
    description: String,
    grammars: Vec<String>,
    middlewares: Vec<BoxedMiddleware>,
    afterwares: Vec<BoxedAfterware>,
    store: Store,
    handler: BoxedHandler,
    /// Filled from `grammars` at registration.
    schemas: Vec<Arc<CompiledSchema>>,
    router: OnceCell<SubcommandRouter>,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared grammars in the order they are tried.
    pub fn grammars(&self) -> &[String] {
        &self.grammars
    }

    /// Compiled grammars, empty until the command is registered.
    pub fn schemas(&self) -> &[Arc<CompiledSchema>] {
        &self.schemas
    }

    pub fn middlewares(&self) -> &[BoxedMiddleware] {
        &self.middlewares
    }

    pub fn afterwares(&self) -> &[BoxedAfterware] {
        &self.afterwares
    }

    /// The static store every dispatch starts from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub(crate) fn set_schemas(&mut self, schemas: Vec<Arc<CompiledSchema>>) {
        self.schemas = schemas;
    }

    /// The router of this command, built by `build` on first use.
    pub(crate) fn router_or_init<F>(&self, build: F) -> &SubcommandRouter
    where
        F: FnOnce(SubcommandRouter) -> SubcommandRouter,
    {
        self.router.get_or_init(|| build(SubcommandRouter::new()))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("grammars", &self.grammars)
            .field("middlewares", &self.middlewares.len())
            .field("afterwares", &self.afterwares.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Command`].
pub struct CommandBuilder {
    name: String,
    description: String,
    grammars: Vec<String>,
    middlewares: Vec<BoxedMiddleware>,
    afterwares: Vec<BoxedAfterware>,
    store: Store,
    handler: Option<BoxedHandler>,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            grammars: Vec::new(),
            middlewares: Vec::new(),
            afterwares: Vec::new(),
            store: Store::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a grammar. Grammars are tried in the order they are added.
    pub fn grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammars.push(grammar.into());
        self
    }

    pub fn grammars<I, S>(mut self, grammars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grammars.extend(grammars.into_iter().map(Into::into));
        self
    }

    /// Adds a middleware that runs after every global middleware.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Adds an afterware that runs after every global afterware.
    pub fn afterware<A: Afterware>(mut self, afterware: A) -> Self {
        self.afterwares.push(Arc::new(afterware));
        self
    }

    pub fn store(mut self, key: impl Into<String>, value: impl Into<StoreValue>) -> Self {
        self.store.insert(key, value);
        self
    }

    pub fn handler<H: CommandHandler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Finishes the command. Without a handler the command does nothing,
    /// which still lets its middleware and afterware run.
    pub fn build(self) -> Command {
        Command {
            name: self.name,
            description: self.description,
            grammars: self.grammars,
            middlewares: self.middlewares,
            afterwares: self.afterwares,
            store: self.store,
            handler: self.handler.unwrap_or_else(|| Arc::new(noop)),
            schemas: Vec::new(),
            router: OnceCell::new(),
        }
    }
}

async fn noop(_ctx: Arc<CommandContext>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::StopSignal;

    #[test]
    fn test_builder_collects_parts() {
        let command = Command::builder("ping")
            .description("pong")
            .grammar("[n:int]")
            .grammars(["go", "stop"])
            .middleware(|_ctx: Arc<CommandContext>, _stop: StopSignal| async {})
            .afterware(|_ctx: Arc<CommandContext>| async {})
            .store("cooldown", 5)
            .build();

        assert_eq!(command.name(), "ping");
        assert_eq!(command.description(), "pong");
        assert_eq!(command.grammars(), ["[n:int]", "go", "stop"]);
        assert_eq!(command.middlewares().len(), 1);
        assert_eq!(command.afterwares().len(), 1);
        assert_eq!(command.store().get_integer("cooldown"), Ok(5));
        assert!(command.schemas().is_empty());
    }
}
