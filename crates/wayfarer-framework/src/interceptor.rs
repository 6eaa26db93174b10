//! Middleware and afterware chains.
//!
//! Middleware runs before a command handler and may veto it through the
//! [`StopSignal`] it receives. Afterware runs once the handler has finished
//! and cannot stop anything. Both are plain async functions:
//!
//! ```rust,ignore
//! async fn only_in_servers(ctx: Arc<CommandContext>, stop: StopSignal) {
//!     if ctx.event().origin().is_private() {
//!         stop.stop();
//!     }
//! }
//!
//! async fn audit(ctx: Arc<CommandContext>) {
//!     info!(command = ctx.command().name(), "Command finished");
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::context::CommandContext;
use crate::error::HandlerResult;
use crate::handler::HandlerResponse;

/// Halts the middleware chain of a single dispatch.
///
/// Clones share the same flag. Once stopped, the remaining middleware, the
/// handler and the afterware are all skipped.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Runs before the handler.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, ctx: Arc<CommandContext>, stop: StopSignal) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> Middleware for F
where
    F: Fn(Arc<CommandContext>, StopSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse + 'static,
{
    async fn handle(&self, ctx: Arc<CommandContext>, stop: StopSignal) -> HandlerResult {
        (self)(ctx, stop).await.into_result()
    }
}

pub type BoxedMiddleware = Arc<dyn Middleware>;

// ============================================================================
// Afterware
// ============================================================================

/// Runs after the handler returned successfully.
#[async_trait]
pub trait Afterware: Send + Sync + 'static {
    async fn handle(&self, ctx: Arc<CommandContext>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> Afterware for F
where
    F: Fn(Arc<CommandContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse + 'static,
{
    async fn handle(&self, ctx: Arc<CommandContext>) -> HandlerResult {
        (self)(ctx).await.into_result()
    }
}

pub type BoxedAfterware = Arc<dyn Afterware>;

/// Global interceptors followed by a command's own.
pub(crate) fn chain<'a, T: ?Sized>(global: &'a [Arc<T>], local: &'a [Arc<T>]) -> impl Iterator<Item = &'a Arc<T>> {
    global.iter().chain(local)
}
