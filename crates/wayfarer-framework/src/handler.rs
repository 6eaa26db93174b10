//! Command handlers.
//!
//! Any async function or closure taking an `Arc<CommandContext>` is a
//! handler, as long as its output implements [`HandlerResponse`]:
//!
//! ```rust,ignore
//! async fn ping(ctx: Arc<CommandContext>) {
//!     println!("pong from {}", ctx.event().author().id);
//! }
//!
//! async fn echo(ctx: Arc<CommandContext>) -> Result<(), MyError> {
//!     let text = ctx.schema().and_then(|s| s.text("message")).ok_or(MyError::Empty)?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::CommandContext;
use crate::error::{BoxError, HandlerResult};

// ============================================================================
// HandlerResponse
// ============================================================================

/// Return values that can end a handler.
///
/// `Err` values become a fault of the dispatch that ran the handler.
pub trait HandlerResponse: Send {
    fn into_result(self) -> HandlerResult;
}

impl HandlerResponse for () {
    fn into_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<T: HandlerResponse> HandlerResponse for Option<T> {
    fn into_result(self) -> HandlerResult {
        self.map_or(Ok(()), HandlerResponse::into_result)
    }
}

impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<BoxError> + Send,
{
    fn into_result(self) -> HandlerResult {
        match self {
            Ok(value) => value.into_result(),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// CommandHandler
// ============================================================================

/// The body of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn call(&self, ctx: Arc<CommandContext>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> CommandHandler for F
where
    F: Fn(Arc<CommandContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse + 'static,
{
    async fn call(&self, ctx: Arc<CommandContext>) -> HandlerResult {
        (self)(ctx).await.into_result()
    }
}

/// A type-erased handler stored in a command.
pub type BoxedHandler = Arc<dyn CommandHandler>;
