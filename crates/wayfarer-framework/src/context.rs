//! Per-dispatch command context.
//!
//! One [`CommandContext`] is created for every message that names a
//! registered command. It is shared through `Arc` with the middleware, the
//! handler and the afterware of that dispatch and dropped afterwards:
//!
//! - the message and the command it invoked
//! - the argument tokens following the command name
//! - the resolved grammar, computed on first access and then cached
//! - a [`Store`] seeded from the command's static store

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use wayfarer_core::{BoxedMessage, CoercionCache, ResolvedSchema, resolve};

use crate::command::Command;
use crate::error::HandlerResult;
use crate::router::SubcommandRouter;
use crate::store::Store;

/// The context handed to command code.
pub struct CommandContext {
    event: BoxedMessage,
    command: Arc<Command>,
    prefix: String,
    args: Vec<String>,
    resolved: OnceCell<Option<Arc<ResolvedSchema>>>,
    store: Mutex<Store>,
}

impl CommandContext {
    pub fn new(event: BoxedMessage, command: Arc<Command>, prefix: String, args: Vec<String>) -> Self {
        let store = Mutex::new(command.store().clone());
        Self {
            event,
            command,
            prefix,
            args,
            resolved: OnceCell::new(),
            store,
        }
    }

    /// The message that triggered this dispatch.
    pub fn event(&self) -> &BoxedMessage {
        &self.event
    }

    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    /// The prefix that was in effect for the message.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tokens after the command name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The first declared grammar the arguments fill.
    ///
    /// Computed once per dispatch. `None` when the command declares no
    /// grammars or none of them matched.
    pub fn schema(&self) -> Option<Arc<ResolvedSchema>> {
        self.resolved
            .get_or_init(|| {
                let mut cache = CoercionCache::new();
                resolve(&self.args, self.command.schemas(), &mut cache).map(Arc::new)
            })
            .clone()
    }

    /// Locks the dispatch store.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock()
    }

    /// Routes this dispatch through the command's subcommand router.
    ///
    /// `build` runs only the first time any dispatch of this command asks for
    /// its router; later calls reuse the router it returned.
    pub async fn route_with<F>(self: Arc<Self>, build: F) -> HandlerResult<bool>
    where
        F: FnOnce(SubcommandRouter) -> SubcommandRouter,
    {
        let command = Arc::clone(&self.command);
        command.router_or_init(build).dispatch(&self).await
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command.name())
            .field("prefix", &self.prefix)
            .field("args", &self.args)
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}
