//! Dispatch filtering and prefix resolution.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayfarer_core::{Author, Origin};

/// Prefix used when nothing else is configured.
pub const DEFAULT_PREFIX: &str = "%";

/// Which messages the dispatcher ignores before looking at their text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Skip direct messages.
    pub ignore_private: bool,
    /// Skip messages sent inside servers.
    pub ignore_servers: bool,
    pub ignored_users: HashSet<u64>,
    pub ignored_servers: HashSet<u64>,
}

/// Why a message was dropped before tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    BotAuthor,
    EmptyContent,
    IgnoredUser,
    IgnoredServer,
    PrivateDisabled,
    ServerDisabled,
}

impl DispatchSettings {
    /// Checks the author and origin of a message against these settings.
    pub fn filter(&self, author: Author, origin: Origin) -> Result<(), FilterReason> {
        if author.is_bot {
            return Err(FilterReason::BotAuthor);
        }
        if self.ignored_users.contains(&author.id) {
            return Err(FilterReason::IgnoredUser);
        }
        match origin {
            Origin::Private if self.ignore_private => Err(FilterReason::PrivateDisabled),
            Origin::Server(_) if self.ignore_servers => Err(FilterReason::ServerDisabled),
            Origin::Server(id) if self.ignored_servers.contains(&id) => Err(FilterReason::IgnoredServer),
            _ => Ok(()),
        }
    }

    pub fn ignore_user(mut self, id: u64) -> Self {
        self.ignored_users.insert(id);
        self
    }

    pub fn ignore_server(mut self, id: u64) -> Self {
        self.ignored_servers.insert(id);
        self
    }
}

// ============================================================================
// Prefix resolution
// ============================================================================

/// Supplies the command prefix for a message.
///
/// Called once per dispatch with the server id of the message, or `None`
/// for direct messages. Implemented for async closures:
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::builder()
///     .prefix(move |server: Option<u64>| {
///         let db = db.clone();
///         async move { db.prefix_for(server).await.unwrap_or_else(|| "!".into()) }
///     })
///     .build();
/// ```
#[async_trait]
pub trait PrefixResolver: Send + Sync + 'static {
    async fn resolve(&self, server: Option<u64>) -> String;
}

#[async_trait]
impl<F, Fut> PrefixResolver for F
where
    F: Fn(Option<u64>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    async fn resolve(&self, server: Option<u64>) -> String {
        (self)(server).await
    }
}

/// The same prefix everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPrefix(String);

impl StaticPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl Default for StaticPrefix {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[async_trait]
impl PrefixResolver for StaticPrefix {
    async fn resolve(&self, _server: Option<u64>) -> String {
        self.0.clone()
    }
}

/// A default prefix with per-server overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPrefixes {
    default: String,
    overrides: HashMap<u64, String>,
}

impl ServerPrefixes {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, server: u64, prefix: impl Into<String>) -> Self {
        self.overrides.insert(server, prefix.into());
        self
    }

    pub fn lookup(&self, server: Option<u64>) -> &str {
        server
            .and_then(|id| self.overrides.get(&id))
            .unwrap_or(&self.default)
    }
}

#[async_trait]
impl PrefixResolver for ServerPrefixes {
    async fn resolve(&self, server: Option<u64>) -> String {
        self.lookup(server).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_order() {
        let settings = DispatchSettings {
            ignore_private: true,
            ..Default::default()
        }
        .ignore_user(5)
        .ignore_server(9);

        assert_eq!(settings.filter(Author::bot(1), Origin::Server(2)), Err(FilterReason::BotAuthor));
        assert_eq!(settings.filter(Author::user(5), Origin::Server(2)), Err(FilterReason::IgnoredUser));
        assert_eq!(settings.filter(Author::user(1), Origin::Private), Err(FilterReason::PrivateDisabled));
        assert_eq!(settings.filter(Author::user(1), Origin::Server(9)), Err(FilterReason::IgnoredServer));
        assert_eq!(settings.filter(Author::user(1), Origin::Server(2)), Ok(()));
    }

    #[test]
    fn test_server_dispatch_disabled() {
        let settings = DispatchSettings {
            ignore_servers: true,
            ..Default::default()
        };
        assert_eq!(settings.filter(Author::user(1), Origin::Server(2)), Err(FilterReason::ServerDisabled));
        assert_eq!(settings.filter(Author::user(1), Origin::Private), Ok(()));
    }

    #[test]
    fn test_prefix_resolvers() {
        tokio_test::block_on(async {
            assert_eq!(StaticPrefix::default().resolve(Some(1)).await, "%");

            let prefixes = ServerPrefixes::new("!").with_override(42, "?");
            assert_eq!(prefixes.resolve(Some(42)).await, "?");
            assert_eq!(prefixes.resolve(Some(7)).await, "!");
            assert_eq!(prefixes.resolve(None).await, "!");

            let closure = |server: Option<u64>| async move { format!("{}>", server.unwrap_or(0)) };
            assert_eq!(closure.resolve(Some(3)).await, "3>");
        });
    }
}
