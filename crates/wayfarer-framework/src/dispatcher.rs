//! Message dispatch.
//!
//! [`Dispatcher`] owns the registered commands, the global interceptors and
//! the dispatch settings. Each call to [`dispatch`](Dispatcher::dispatch)
//! walks one message through a fixed sequence of stages:
//!
//! ```text
//! Received ──▶ Filtered ──▶ Tokenized ──▶ Identified ──▶ Resolved ──▶ Executed ──▶ Terminated
//!    │            │             │              │             │            │
//!    └── dropped ─┴── dropped ──┴── dropped ───┴── stopped ──┴─ faulted ──┘
//! ```
//!
//! - **Received → Filtered**: content access, bot authors, empty text,
//!   ignored users and servers, disabled origins
//! - **Filtered → Tokenized**: prefix resolution, then tokenization that
//!   gives up on the first token when its length cannot be a prefixed name
//! - **Tokenized → Identified**: prefix stripping and exact name lookup
//! - **Identified → Resolved**: the first declared grammar the arguments fill
//! - **Resolved → Executed**: global then command middleware, the handler,
//!   then global then command afterware
//!
//! Failures of user code, returned errors and panics alike, are contained
//! here: they are logged and end only the dispatch that raised them.
//!
//! # Example
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder()
//!     .prefix(StaticPrefix::new("!"))
//!     .middleware(log_invocations)
//!     .build();
//!
//! dispatcher.register(Command::builder("ping").handler(ping).build())?;
//! dispatcher.dispatch(TextMessage::private(1, "!ping").boxed()).await;
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{Instrument, Level, Span, debug, error, field, info, span, trace, warn};
use wayfarer_core::{BoxedMessage, SchemaCache, for_each_token};

use crate::command::Command;
use crate::context::CommandContext;
use crate::error::{BoxError, HandlerResult, RegisterError, RegisterResult};
use crate::interceptor::{Afterware, BoxedAfterware, BoxedMiddleware, Middleware, StopSignal, chain};
use crate::registry::{CommandRegistry, RegistrySnapshot};
use crate::settings::{DispatchSettings, FilterReason, PrefixResolver, StaticPrefix};

// ============================================================================
// Outcomes
// ============================================================================

/// Stages a message passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchStage {
    Received,
    Filtered,
    Tokenized,
    Identified,
    Resolved,
    Executed,
    Terminated,
}

/// Why a message was dropped without running any command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The platform withheld message content.
    NoContentAccess,
    /// The author, origin or text was filtered out.
    Filtered(FilterReason),
    /// The first token cannot be a prefixed command name.
    FastReject,
    /// The first token does not start with the prefix.
    MissingPrefix,
    UnknownCommand,
    /// The command declares grammars and the arguments fill none of them.
    NoMatchingGrammar,
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dropped after reaching `stage`.
    Dropped { stage: DispatchStage, reason: DropReason },
    /// A middleware raised the stop signal.
    Stopped,
    /// The handler and every afterware ran.
    Completed,
    /// User code failed. `Resolved` for middleware and handler failures,
    /// `Executed` for afterware failures.
    Faulted { stage: DispatchStage },
}

impl DispatchOutcome {
    fn dropped(stage: DispatchStage, reason: DropReason) -> Self {
        trace!(?stage, ?reason, "Message dropped");
        Self::Dropped { stage, reason }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

struct DispatcherInner {
    registry: CommandRegistry,
    schemas: Arc<SchemaCache>,
    prefix: RwLock<Arc<dyn PrefixResolver>>,
    settings: RwLock<Arc<DispatchSettings>>,
    middlewares: RwLock<Arc<Vec<BoxedMiddleware>>>,
    afterwares: RwLock<Arc<Vec<BoxedAfterware>>>,
}

/// Routes messages to registered commands.
///
/// Cloning is cheap; clones share commands, interceptors and settings.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    /// Compiles the grammars of `command` and registers it.
    ///
    /// Name bounds are updated before this returns, so the very next
    /// dispatch can reach the command.
    pub fn register(&self, mut command: Command) -> RegisterResult<Arc<Command>> {
        let name = command.name().to_string();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RegisterError::InvalidName { name });
        }
        if self.inner.registry.get(&name).is_some() {
            return Err(RegisterError::DuplicateName { name });
        }

        let schemas = self.inner.schemas.load(&name, command.grammars())?;
        command.set_schemas(schemas);

        let command = Arc::new(command);
        if !self.inner.registry.insert(Arc::clone(&command)) {
            return Err(RegisterError::DuplicateName { name });
        }

        info!(command = %name, grammars = command.grammars().len(), "Command registered");
        Ok(command)
    }

    /// Removes the command called `name`.
    pub fn unregister(&self, name: &str) -> Option<Arc<Command>> {
        let removed = self.inner.registry.remove(name);
        if removed.is_some() {
            info!(command = %name, "Command unregistered");
        }
        removed
    }

    pub fn command(&self, name: &str) -> Option<Arc<Command>> {
        self.inner.registry.get(name)
    }

    /// A consistent view of every registered command.
    pub fn commands(&self) -> Arc<RegistrySnapshot> {
        self.inner.registry.snapshot()
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.inner.schemas
    }

    // ─── Interceptors and settings ──────────────────────────────────────────

    /// Appends a global middleware. Runs before every command's own.
    pub fn add_middleware<M: Middleware>(&self, middleware: M) {
        let mut current = self.inner.middlewares.write();
        let mut next: Vec<BoxedMiddleware> = current.iter().cloned().collect();
        next.push(Arc::new(middleware));
        *current = Arc::new(next);
    }

    /// Appends a global afterware. Runs before every command's own.
    pub fn add_afterware<A: Afterware>(&self, afterware: A) {
        let mut current = self.inner.afterwares.write();
        let mut next: Vec<BoxedAfterware> = current.iter().cloned().collect();
        next.push(Arc::new(afterware));
        *current = Arc::new(next);
    }

    pub fn settings(&self) -> Arc<DispatchSettings> {
        Arc::clone(&self.inner.settings.read())
    }

    /// Replaces the filter settings for subsequent dispatches.
    pub fn set_settings(&self, settings: DispatchSettings) {
        *self.inner.settings.write() = Arc::new(settings);
    }

    /// Replaces the prefix resolver for subsequent dispatches.
    pub fn set_prefix<P: PrefixResolver>(&self, prefix: P) {
        *self.inner.prefix.write() = Arc::new(prefix);
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Runs `event` through every dispatch stage.
    ///
    /// Never fails: every way a dispatch can end is reported as a
    /// [`DispatchOutcome`].
    pub async fn dispatch(&self, event: BoxedMessage) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            author = event.author().id,
            origin = %event.origin(),
            command = field::Empty
        );
        self.run(event).instrument(span).await
    }

    async fn run(&self, event: BoxedMessage) -> DispatchOutcome {
        use DispatchStage::*;

        // Received → Filtered
        if !event.has_content_access() {
            warn!("Message content access is not granted; commands cannot be read");
            return DispatchOutcome::dropped(Received, DropReason::NoContentAccess);
        }
        let author = event.author();
        let origin = event.origin();
        if let Err(reason) = self.settings().filter(author, origin) {
            return DispatchOutcome::dropped(Received, DropReason::Filtered(reason));
        }
        let content = event.content().trim();
        if content.is_empty() {
            return DispatchOutcome::dropped(Received, DropReason::Filtered(FilterReason::EmptyContent));
        }

        // Filtered → Tokenized
        let resolver = Arc::clone(&self.inner.prefix.read());
        let prefix = resolver.resolve(origin.server_id()).await;
        let commands = self.inner.registry.snapshot();
        let Some(bounds) = commands.bounds() else {
            return DispatchOutcome::dropped(Filtered, DropReason::UnknownCommand);
        };

        let prefix_len = prefix.chars().count();
        let mut tokens: Vec<String> = Vec::new();
        let completed = for_each_token(content, |token| {
            if tokens.is_empty() && !bounds.admits(token.chars().count(), prefix_len) {
                return false;
            }
            tokens.push(token.to_string());
            true
        });
        if !completed {
            return DispatchOutcome::dropped(Filtered, DropReason::FastReject);
        }

        // Tokenized → Identified
        let mut tokens = tokens.into_iter();
        let Some(name) = tokens.next().and_then(|first| first.strip_prefix(prefix.as_str()).map(str::to_string))
        else {
            return DispatchOutcome::dropped(Tokenized, DropReason::MissingPrefix);
        };
        let Some(command) = commands.get(&name).cloned() else {
            return DispatchOutcome::dropped(Tokenized, DropReason::UnknownCommand);
        };
        Span::current().record("command", name.as_str());

        // Identified → Resolved
        let ctx = Arc::new(CommandContext::new(event, command, prefix, tokens.collect()));
        if !ctx.command().schemas().is_empty() && ctx.schema().is_none() {
            debug!(args = ?ctx.args(), "Arguments match no grammar");
            return DispatchOutcome::dropped(Identified, DropReason::NoMatchingGrammar);
        }

        // Resolved → Executed
        self.execute(ctx).await
    }

    async fn execute(&self, ctx: Arc<CommandContext>) -> DispatchOutcome {
        let command = Arc::clone(ctx.command());
        let middlewares = Arc::clone(&self.inner.middlewares.read());
        let afterwares = Arc::clone(&self.inner.afterwares.read());

        let stop = StopSignal::new();
        for middleware in chain(middlewares.as_slice(), command.middlewares()) {
            if let Err(err) = guarded(middleware.handle(Arc::clone(&ctx), stop.clone())).await {
                error!(error = %err, "Middleware failed");
                return DispatchOutcome::Faulted {
                    stage: DispatchStage::Resolved,
                };
            }
            if stop.is_stopped() {
                debug!("Dispatch stopped by middleware");
                return DispatchOutcome::Stopped;
            }
        }

        if let Err(err) = guarded(command.handler().call(Arc::clone(&ctx))).await {
            error!(error = %err, "Command handler failed");
            return DispatchOutcome::Faulted {
                stage: DispatchStage::Resolved,
            };
        }

        for afterware in chain(afterwares.as_slice(), command.afterwares()) {
            if let Err(err) = guarded(afterware.handle(Arc::clone(&ctx))).await {
                error!(error = %err, "Afterware failed");
                return DispatchOutcome::Faulted {
                    stage: DispatchStage::Executed,
                };
            }
        }

        debug!("Command completed");
        DispatchOutcome::Completed
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.inner.registry.len())
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}

/// Awaits user code, turning a panic into an error.
async fn guarded<F>(future: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(panic_message(panic)),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> BoxError {
    let message = match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic payload".to_string(),
        },
    };
    format!("panicked: {message}").into()
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    prefix: Option<Arc<dyn PrefixResolver>>,
    settings: DispatchSettings,
    schemas: Option<Arc<SchemaCache>>,
    middlewares: Vec<BoxedMiddleware>,
    afterwares: Vec<BoxedAfterware>,
}

impl DispatcherBuilder {
    /// Sets the prefix resolver. Defaults to [`StaticPrefix::default`].
    pub fn prefix<P: PrefixResolver>(mut self, prefix: P) -> Self {
        self.prefix = Some(Arc::new(prefix));
        self
    }

    pub fn settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Shares a schema cache with other dispatchers.
    pub fn schema_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.schemas = Some(cache);
        self
    }

    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn afterware<A: Afterware>(mut self, afterware: A) -> Self {
        self.afterwares.push(Arc::new(afterware));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                registry: CommandRegistry::new(),
                schemas: self.schemas.unwrap_or_default(),
                prefix: RwLock::new(self.prefix.unwrap_or_else(|| Arc::new(StaticPrefix::default()))),
                settings: RwLock::new(Arc::new(self.settings)),
                middlewares: RwLock::new(Arc::new(self.middlewares)),
                afterwares: RwLock::new(Arc::new(self.afterwares)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use wayfarer_core::{SchemaErrorKind, TextMessage};

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder().prefix(StaticPrefix::new("!")).build()
    }

    fn recording(log: &Log) -> impl Fn(Arc<CommandContext>) -> futures::future::Ready<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |ctx: Arc<CommandContext>| {
            log.lock().push(format!("{}:{}", ctx.command().name(), ctx.args().join(",")));
            futures::future::ready(())
        }
    }

    fn tagging(log: &Log, tag: &'static str) -> impl Fn(Arc<CommandContext>) -> futures::future::Ready<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_ctx: Arc<CommandContext>| {
            log.lock().push(tag.to_string());
            futures::future::ready(())
        }
    }

    fn tagging_mw(
        log: &Log,
        tag: &'static str,
    ) -> impl Fn(Arc<CommandContext>, StopSignal) -> futures::future::Ready<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_ctx: Arc<CommandContext>, _stop: StopSignal| {
            log.lock().push(tag.to_string());
            futures::future::ready(())
        }
    }

    fn message(content: &str) -> BoxedMessage {
        TextMessage::in_server(10, 1, content).boxed()
    }

    #[tokio::test]
    async fn test_prefixed_message_invokes_handler() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(Command::builder("ping").handler(recording(&log)).build())
            .unwrap();

        let outcome = dispatcher.dispatch(message("!ping 5")).await;
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(*log.lock(), vec!["ping:5"]);
    }

    #[tokio::test]
    async fn test_unprefixed_message_is_dropped() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(Command::builder("ping").handler(recording(&log)).build())
            .unwrap();

        let outcome = dispatcher.dispatch(message("ping 5")).await;
        assert!(matches!(outcome, DispatchOutcome::Dropped { .. }));

        let outcome = dispatcher.dispatch(message("?ping 5")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Tokenized,
                reason: DropReason::MissingPrefix
            }
        );
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_user_is_dropped() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(Command::builder("ping").handler(recording(&log)).build())
            .unwrap();
        dispatcher.set_settings(DispatchSettings::default().ignore_user(1));

        let outcome = dispatcher.dispatch(message("!ping 5")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Received,
                reason: DropReason::Filtered(FilterReason::IgnoredUser)
            }
        );
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_filters_before_tokenizing() {
        let dispatcher = dispatcher();
        dispatcher.register(Command::builder("ping").build()).unwrap();

        let bot = TextMessage::in_server(10, 2, "!ping").from_bot().boxed();
        assert_eq!(
            dispatcher.dispatch(bot).await,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Received,
                reason: DropReason::Filtered(FilterReason::BotAuthor)
            }
        );

        assert_eq!(
            dispatcher.dispatch(message("   ")).await,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Received,
                reason: DropReason::Filtered(FilterReason::EmptyContent)
            }
        );

        let blind = TextMessage::in_server(10, 2, "!ping").without_content_access().boxed();
        assert_eq!(
            dispatcher.dispatch(blind).await,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Received,
                reason: DropReason::NoContentAccess
            }
        );
    }

    #[tokio::test]
    async fn test_fast_reject_uses_name_bounds() {
        let dispatcher = dispatcher();
        dispatcher.register(Command::builder("ping").build()).unwrap();
        dispatcher.register(Command::builder("info").build()).unwrap();

        let outcome = dispatcher.dispatch(message("!pingpong and \"more")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Filtered,
                reason: DropReason::FastReject
            }
        );

        let outcome = dispatcher.dispatch(message("!pin")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Filtered,
                reason: DropReason::FastReject
            }
        );

        let outcome = dispatcher.dispatch(message("!pong")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Tokenized,
                reason: DropReason::UnknownCommand
            }
        );
    }

    #[tokio::test]
    async fn test_empty_registry_drops_everything() {
        let outcome = dispatcher().dispatch(message("!ping")).await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Dropped {
                reason: DropReason::UnknownCommand,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unregister_updates_bounds() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(Command::builder("go").handler(recording(&log)).build())
            .unwrap();
        dispatcher.register(Command::builder("settings").build()).unwrap();

        assert!(dispatcher.unregister("settings").is_some());
        assert!(dispatcher.unregister("settings").is_none());

        let outcome = dispatcher.dispatch(message("!settings")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Filtered,
                reason: DropReason::FastReject
            }
        );
        assert!(dispatcher.dispatch(message("!go")).await.is_completed());
        assert_eq!(*log.lock(), vec!["go:"]);
    }

    #[tokio::test]
    async fn test_grammars_gate_the_handler() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(
                Command::builder("ping")
                    .grammar("user [user:user] [*message:string]")
                    .grammar("channel [channel:channel]")
                    .handler(recording(&log))
                    .build(),
            )
            .unwrap();

        assert!(dispatcher.dispatch(message("!ping user <@5> hi there")).await.is_completed());
        assert!(dispatcher.dispatch(message("!ping channel <#6>")).await.is_completed());
        assert_eq!(
            dispatcher.dispatch(message("!ping role <@&7>")).await,
            DispatchOutcome::Dropped {
                stage: DispatchStage::Identified,
                reason: DropReason::NoMatchingGrammar
            }
        );
        assert_eq!(log.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_interceptor_order() {
        let log = Log::default();
        let dispatcher = Dispatcher::builder()
            .prefix(StaticPrefix::new("!"))
            .middleware(tagging_mw(&log, "global-mw"))
            .afterware(tagging(&log, "global-aw"))
            .build();
        dispatcher.add_middleware(tagging_mw(&log, "global-mw-2"));
        dispatcher
            .register(
                Command::builder("ping")
                    .middleware(tagging_mw(&log, "local-mw"))
                    .afterware(tagging(&log, "local-aw"))
                    .handler(tagging(&log, "handler"))
                    .build(),
            )
            .unwrap();

        assert!(dispatcher.dispatch(message("!ping")).await.is_completed());
        assert_eq!(
            *log.lock(),
            vec!["global-mw", "global-mw-2", "local-mw", "handler", "global-aw", "local-aw"]
        );
    }

    #[tokio::test]
    async fn test_stop_skips_handler_but_not_later_dispatches() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher.add_middleware(|ctx: Arc<CommandContext>, stop: StopSignal| async move {
            if ctx.args().first().map(String::as_str) == Some("deny") {
                stop.stop();
            }
        });
        dispatcher
            .register(
                Command::builder("ping")
                    .middleware(tagging_mw(&log, "local-mw"))
                    .afterware(tagging(&log, "afterware"))
                    .handler(recording(&log))
                    .build(),
            )
            .unwrap();

        assert_eq!(dispatcher.dispatch(message("!ping deny")).await, DispatchOutcome::Stopped);
        assert!(log.lock().is_empty());

        assert!(dispatcher.dispatch(message("!ping allow")).await.is_completed());
        assert_eq!(*log.lock(), vec!["local-mw", "ping:allow", "afterware"]);
    }

    #[tokio::test]
    async fn test_handler_error_is_contained() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(
                Command::builder("fail")
                    .afterware(tagging(&log, "afterware"))
                    .handler(|_ctx: Arc<CommandContext>| async { Err::<(), _>("nope") })
                    .build(),
            )
            .unwrap();
        dispatcher
            .register(Command::builder("ok").handler(recording(&log)).build())
            .unwrap();

        assert_eq!(
            dispatcher.dispatch(message("!fail")).await,
            DispatchOutcome::Faulted {
                stage: DispatchStage::Resolved
            }
        );
        assert!(dispatcher.dispatch(message("!ok")).await.is_completed());
        assert_eq!(*log.lock(), vec!["ok:"]);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let log = Log::default();
        let dispatcher = dispatcher();
        dispatcher
            .register(
                Command::builder("boom")
                    .handler(|_ctx: Arc<CommandContext>| async {
                        if true {
                            panic!("handler exploded");
                        }
                    })
                    .build(),
            )
            .unwrap();
        dispatcher
            .register(Command::builder("ok").handler(recording(&log)).build())
            .unwrap();

        assert_eq!(
            dispatcher.dispatch(message("!boom")).await,
            DispatchOutcome::Faulted {
                stage: DispatchStage::Resolved
            }
        );
        assert!(dispatcher.dispatch(message("!ok")).await.is_completed());
    }

    #[tokio::test]
    async fn test_afterware_error_is_contained() {
        let dispatcher = dispatcher();
        dispatcher.add_afterware(|_ctx: Arc<CommandContext>| async { Err::<(), _>("late") });
        dispatcher.register(Command::builder("ping").build()).unwrap();

        assert_eq!(
            dispatcher.dispatch(message("!ping")).await,
            DispatchOutcome::Faulted {
                stage: DispatchStage::Executed
            }
        );
    }

    #[tokio::test]
    async fn test_prefix_resolved_per_server() {
        let log = Log::default();
        let dispatcher = Dispatcher::builder()
            .prefix(|server: Option<u64>| async move {
                match server {
                    Some(10) => "$".to_string(),
                    _ => ">>".to_string(),
                }
            })
            .build();
        dispatcher
            .register(Command::builder("ping").handler(recording(&log)).build())
            .unwrap();

        assert!(dispatcher.dispatch(message("$ping")).await.is_completed());
        assert!(
            dispatcher
                .dispatch(TextMessage::private(1, ">>ping").boxed())
                .await
                .is_completed()
        );
        assert!(!dispatcher.dispatch(message(">>ping")).await.is_completed());
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_register_rejects_bad_commands() {
        let dispatcher = dispatcher();
        dispatcher.register(Command::builder("ping").build()).unwrap();

        assert!(matches!(
            dispatcher.register(Command::builder("").build()),
            Err(RegisterError::EmptyName)
        ));
        assert!(matches!(
            dispatcher.register(Command::builder("two words").build()),
            Err(RegisterError::InvalidName { .. })
        ));
        assert!(matches!(
            dispatcher.register(Command::builder("ping").build()),
            Err(RegisterError::DuplicateName { .. })
        ));

        let err = dispatcher
            .register(Command::builder("bad").grammar("[x:bogus]").build())
            .unwrap_err();
        match err {
            RegisterError::Schema(err) => {
                assert_eq!(err.command, "bad");
                assert!(matches!(err.kind, SchemaErrorKind::UnknownType { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dispatcher.command("bad").is_none());
        assert_eq!(dispatcher.commands().len(), 1);
    }

    #[test]
    fn test_registered_command_carries_compiled_schemas() {
        let dispatcher = dispatcher();
        let command = dispatcher
            .register(Command::builder("ping").grammars(["[n:int]", "go"]).build())
            .unwrap();

        assert_eq!(command.schemas().len(), 2);
        assert_eq!(dispatcher.schema_cache().len(), 2);
    }

    #[test]
    fn test_dispatch_blocks_on_plain_executor() {
        let dispatcher = dispatcher();
        dispatcher.register(Command::builder("ping").build()).unwrap();
        let outcome = tokio_test::block_on(dispatcher.dispatch(message("!ping")));
        assert!(outcome.is_completed());
    }
}
