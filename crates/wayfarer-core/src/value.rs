//! Typed argument values and token coercion.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::schema::ArgumentType;

static USER_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<@!?(?P<id>[0-9]{1,20})>|(?P<raw>[0-9]{1,20}))$").expect("Invalid Regex"));
static CHANNEL_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<#(?P<id>[0-9]{1,20})>|(?P<raw>[0-9]{1,20}))$").expect("Invalid Regex"));
static ROLE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<@&(?P<id>[0-9]{1,20})>|(?P<raw>[0-9]{1,20}))$").expect("Invalid Regex"));
static CUSTOM_EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:<a?:[A-Za-z0-9_]+:(?P<id>[0-9]{1,20})>|(?P<raw>[0-9]{1,20}))$").expect("Invalid Regex")
});
static MESSAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^https?://(?:(?:ptb|canary)\.)?discord(?:app)?\.com/channels/(?:(?P<server>[0-9]{1,20})|@me)/(?P<channel>[0-9]{1,20})/(?P<message>[0-9]{1,20})$",
    )
    .expect("Invalid Regex")
});

/// Location of a message parsed from a message link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageLink {
    /// `None` for links into private channels.
    pub server: Option<u64>,
    pub channel: u64,
    pub message: u64,
}

/// A token coerced into the type its slot asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgumentValue {
    User(u64),
    Channel(u64),
    Role(u64),
    Message(MessageLink),
    CustomEmoji(u64),
    Text(String),
    Integer(i32),
    Long(i64),
    Boolean(bool),
    Float(f32),
    Double(f64),
    /// The keyword as the user typed it.
    Identifier(String),
}

impl ArgumentValue {
    /// The slot type that produces this kind of value.
    pub fn ty(&self) -> ArgumentType {
        match self {
            Self::User(_) => ArgumentType::User,
            Self::Channel(_) => ArgumentType::Channel,
            Self::Role(_) => ArgumentType::Role,
            Self::Message(_) => ArgumentType::Message,
            Self::CustomEmoji(_) => ArgumentType::CustomEmoji,
            Self::Text(_) => ArgumentType::Text,
            Self::Integer(_) => ArgumentType::Integer,
            Self::Long(_) => ArgumentType::Long,
            Self::Boolean(_) => ArgumentType::Boolean,
            Self::Float(_) => ArgumentType::Float,
            Self::Double(_) => ArgumentType::Double,
            Self::Identifier(_) => ArgumentType::Identifier,
        }
    }

    /// Coerces `token` into `ty`, or `None` if it does not parse.
    ///
    /// Identifier slots are not handled here since they need the expected
    /// keyword; see [`coerce_identifier`].
    pub fn coerce(token: &str, ty: ArgumentType) -> Option<Self> {
        match ty {
            ArgumentType::User => snowflake(&USER_MENTION, token).map(Self::User),
            ArgumentType::Channel => snowflake(&CHANNEL_MENTION, token).map(Self::Channel),
            ArgumentType::Role => snowflake(&ROLE_MENTION, token).map(Self::Role),
            ArgumentType::CustomEmoji => snowflake(&CUSTOM_EMOJI, token).map(Self::CustomEmoji),
            ArgumentType::Message => message_link(token).map(Self::Message),
            ArgumentType::Text => Some(Self::Text(token.to_string())),
            ArgumentType::Integer => token.parse().ok().map(Self::Integer),
            ArgumentType::Long => token.parse().ok().map(Self::Long),
            ArgumentType::Boolean => token.parse().ok().map(Self::Boolean),
            ArgumentType::Float => token.parse().ok().map(Self::Float),
            ArgumentType::Double => token.parse().ok().map(Self::Double),
            ArgumentType::Identifier => None,
        }
    }
}

/// Matches `token` against the keyword of an identifier slot, ignoring case.
pub fn coerce_identifier(token: &str, literal: &str) -> Option<ArgumentValue> {
    (token.to_lowercase() == literal.to_lowercase()).then(|| ArgumentValue::Identifier(token.to_string()))
}

fn snowflake(pattern: &Regex, token: &str) -> Option<u64> {
    let caps = pattern.captures(token)?;
    caps.name("id")
        .or_else(|| caps.name("raw"))
        .and_then(|m| m.as_str().parse().ok())
}

fn message_link(token: &str) -> Option<MessageLink> {
    let caps = MESSAGE_LINK.captures(token)?;
    let number = |caps: &Captures<'_>, name: &str| -> Option<u64> {
        caps.name(name).and_then(|m| m.as_str().parse().ok())
    };
    Some(MessageLink {
        server: number(&caps, "server"),
        channel: number(&caps, "channel")?,
        message: number(&caps, "message")?,
    })
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "<@{id}>"),
            Self::Channel(id) => write!(f, "<#{id}>"),
            Self::Role(id) => write!(f, "<@&{id}>"),
            Self::CustomEmoji(id) => write!(f, "{id}"),
            Self::Message(link) => match link.server {
                Some(server) => write!(f, "{server}/{}/{}", link.channel, link.message),
                None => write!(f, "@me/{}/{}", link.channel, link.message),
            },
            Self::Text(text) | Self::Identifier(text) => f.write_str(text),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}
