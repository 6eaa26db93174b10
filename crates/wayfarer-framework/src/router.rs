//! Subcommand routing inside a command handler.
//!
//! A router maps space-separated keys to routes. It compares the leading
//! argument tokens of a dispatch with each key, ignoring case, and runs the
//! first route whose words all match.
//!
//! ```rust,ignore
//! async fn settings(ctx: Arc<CommandContext>) -> HandlerResult {
//!     ctx.route_with(|router| {
//!         router
//!             .route("prefix set", set_prefix)
//!             .route("prefix reset", reset_prefix)
//!             .route("user", show_user)
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use wayfarer_core::ResolvedSchema;

use crate::context::CommandContext;
use crate::error::HandlerResult;
use crate::handler::HandlerResponse;

/// A subcommand body.
///
/// `schema` is the resolved grammar of the dispatch, present only when the
/// command declares grammars.
#[async_trait]
pub trait Route: Send + Sync + 'static {
    async fn call(&self, ctx: Arc<CommandContext>, schema: Option<Arc<ResolvedSchema>>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, Res> Route for F
where
    F: Fn(Arc<CommandContext>, Option<Arc<ResolvedSchema>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse + 'static,
{
    async fn call(&self, ctx: Arc<CommandContext>, schema: Option<Arc<ResolvedSchema>>) -> HandlerResult {
        (self)(ctx, schema).await.into_result()
    }
}

struct RouteEntry {
    key: String,
    words: Vec<String>,
    route: Arc<dyn Route>,
}

impl RouteEntry {
    fn matches(&self, tokens: &[String]) -> bool {
        self.words.len() <= tokens.len()
            && self
                .words
                .iter()
                .zip(tokens)
                .all(|(word, token)| token.to_lowercase() == *word)
    }
}

/// Ordered routes keyed by space-separated words.
#[derive(Default)]
pub struct SubcommandRouter {
    routes: Vec<RouteEntry>,
}

impl SubcommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route. Declaring a key twice replaces the first route in place.
    ///
    /// A key without any words could never be told apart from other routes
    /// and is skipped.
    pub fn route<R: Route>(mut self, key: impl Into<String>, route: R) -> Self {
        let key = key.into();
        let words: Vec<String> = key.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            warn!(key = %key, "Ignoring subcommand route with an empty key");
            return self;
        }
        let entry = RouteEntry {
            key,
            words,
            route: Arc::new(route),
        };

        match self.routes.iter_mut().find(|existing| existing.words == entry.words) {
            Some(existing) => *existing = entry,
            None => self.routes.push(entry),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|entry| entry.key.as_str())
    }

    /// Runs the first route matching the arguments of `ctx`.
    ///
    /// Returns whether a route ran. A dispatch without arguments never
    /// matches.
    pub async fn dispatch(&self, ctx: &Arc<CommandContext>) -> HandlerResult<bool> {
        let tokens = ctx.args();
        if tokens.is_empty() {
            return Ok(false);
        }

        let Some(entry) = self.routes.iter().find(|entry| entry.matches(tokens)) else {
            debug!(command = ctx.command().name(), "No subcommand route matched");
            return Ok(false);
        };

        debug!(command = ctx.command().name(), route = %entry.key, "Routing subcommand");
        entry.route.call(Arc::clone(ctx), ctx.schema()).await?;
        Ok(true)
    }
}

impl fmt::Debug for SubcommandRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
