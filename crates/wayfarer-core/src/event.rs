//! The inbound message boundary.
//!
//! Platform clients implement [`MessageEvent`] for their concrete message
//! type. The dispatcher only reads the text, the author and the origin; the
//! rest of the platform object stays reachable for handlers through
//! [`MessageEvent::as_any`].
//!
//! ```rust,ignore
//! async fn reply(ctx: Arc<CommandContext>) {
//!     if let Some(msg) = ctx.event().as_any().downcast_ref::<DiscordMessage>() {
//!         msg.channel().send("pong").await;
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    /// Bots and webhooks. Their messages are never dispatched.
    pub is_bot: bool,
}

impl Author {
    pub fn user(id: u64) -> Self {
        Self { id, is_bot: false }
    }

    pub fn bot(id: u64) -> Self {
        Self { id, is_bot: true }
    }
}

/// Where a message was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// A direct message.
    Private,
    /// A channel inside a server.
    Server(u64),
}

impl Origin {
    pub fn server_id(self) -> Option<u64> {
        match self {
            Self::Private => None,
            Self::Server(id) => Some(id),
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("private"),
            Self::Server(id) => write!(f, "server:{id}"),
        }
    }
}

/// A received chat message.
pub trait MessageEvent: Any + Send + Sync {
    /// Raw message text.
    fn content(&self) -> &str;

    fn author(&self) -> Author;

    fn origin(&self) -> Origin;

    /// Whether the client was granted access to message text.
    ///
    /// Without it platforms deliver empty content for most messages, so the
    /// dispatcher warns and gives up instead of silently matching nothing.
    fn has_content_access(&self) -> bool {
        true
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A shared, type-erased message.
pub type BoxedMessage = Arc<dyn MessageEvent>;

// ============================================================================
// Plain text message
// ============================================================================

/// A platform-neutral message carrying only what the dispatcher reads.
///
/// Useful for consoles, bridges and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub content: String,
    pub author: Author,
    pub origin: Origin,
    pub content_access: bool,
}

impl TextMessage {
    /// A message from a regular user in a direct conversation.
    pub fn private(author: u64, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: Author::user(author),
            origin: Origin::Private,
            content_access: true,
        }
    }

    /// A message from a regular user inside `server`.
    pub fn in_server(server: u64, author: u64, content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Server(server),
            ..Self::private(author, content)
        }
    }

    pub fn from_bot(mut self) -> Self {
        self.author.is_bot = true;
        self
    }

    pub fn without_content_access(mut self) -> Self {
        self.content_access = false;
        self
    }

    pub fn boxed(self) -> BoxedMessage {
        Arc::new(self)
    }
}

impl MessageEvent for TextMessage {
    fn content(&self) -> &str {
        &self.content
    }

    fn author(&self) -> Author {
        self.author
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    fn has_content_access(&self) -> bool {
        self.content_access
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_builders() {
        let msg = TextMessage::in_server(7, 1, "!ping").from_bot();
        assert_eq!(msg.origin().server_id(), Some(7));
        assert!(msg.author().is_bot);
        assert!(msg.has_content_access());
        assert!(!msg.clone().without_content_access().has_content_access());
        assert!(TextMessage::private(1, "hi").origin().is_private());
    }

    #[test]
    fn test_downcast_through_boxed() {
        let boxed = TextMessage::private(3, "hello").boxed();
        let concrete = boxed.as_any().downcast_ref::<TextMessage>().unwrap();
        assert_eq!(concrete.content, "hello");
        assert_eq!(boxed.author(), Author::user(3));
    }
}
