//! Compiled grammar representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of the synthesized name given to bare-word grammar slots.
pub const IDENTIFIER_PREFIX: &str = "identifier:";

/// The kind of value a grammar slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentType {
    /// A user mention or raw user id.
    User,
    /// A channel mention or raw channel id.
    Channel,
    /// A role mention or raw role id.
    Role,
    /// A link to a message.
    Message,
    /// A custom emoji or raw emoji id.
    CustomEmoji,
    /// Any text.
    Text,
    /// A 32-bit signed integer.
    Integer,
    /// A 64-bit signed integer.
    Long,
    /// `true` or `false`.
    Boolean,
    /// A 32-bit float.
    Float,
    /// A 64-bit float.
    Double,
    /// A bare keyword matched literally. Never requested by name.
    Identifier,
}

impl ArgumentType {
    /// Every type in declaration order.
    pub const ALL: [ArgumentType; 12] = [
        Self::User,
        Self::Channel,
        Self::Role,
        Self::Message,
        Self::CustomEmoji,
        Self::Text,
        Self::Integer,
        Self::Long,
        Self::Boolean,
        Self::Float,
        Self::Double,
        Self::Identifier,
    ];

    /// The name used for this type inside a grammar.
    pub fn key(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Role => "role",
            Self::Message => "message",
            Self::CustomEmoji => "emoji",
            Self::Text => "string",
            Self::Integer => "int",
            Self::Long => "long",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Double => "double",
            Self::Identifier => "identifier",
        }
    }

    /// Looks up a type by its grammar key, ignoring ASCII case.
    ///
    /// The reserved `identifier` key resolves too; the compiler is the one
    /// that refuses it.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One named, typed position in a compiled grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSlot {
    name: String,
    ty: ArgumentType,
    variadic: bool,
}

impl ArgumentSlot {
    pub(crate) fn typed(name: String, ty: ArgumentType, variadic: bool) -> Self {
        Self { name, ty, variadic }
    }

    pub(crate) fn identifier(word: &str) -> Self {
        Self {
            name: format!("{IDENTIFIER_PREFIX}{word}"),
            ty: ArgumentType::Identifier,
            variadic: false,
        }
    }

    /// The slot name. Identifier slots are named `identifier:<word>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ArgumentType {
        self.ty
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// The keyword an identifier slot matches, `None` for typed slots.
    pub fn literal(&self) -> Option<&str> {
        match self.ty {
            ArgumentType::Identifier => self.name.strip_prefix(IDENTIFIER_PREFIX),
            _ => None,
        }
    }
}

/// An immutable, compiled grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchema {
    source: String,
    slots: Vec<ArgumentSlot>,
    has_variadic: bool,
}

impl CompiledSchema {
    pub(crate) fn new(source: String, slots: Vec<ArgumentSlot>) -> Self {
        let has_variadic = slots.last().is_some_and(ArgumentSlot::is_variadic);
        Self {
            source,
            slots,
            has_variadic,
        }
    }

    /// The grammar string this schema was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    pub fn has_variadic(&self) -> bool {
        self.has_variadic
    }

    /// Slots that take exactly one token each.
    pub fn fixed_slots(&self) -> &[ArgumentSlot] {
        if self.has_variadic {
            &self.slots[..self.slots.len() - 1]
        } else {
            &self.slots
        }
    }

    /// The trailing variadic slot, if declared.
    pub fn variadic_slot(&self) -> Option<&ArgumentSlot> {
        self.slots.last().filter(|slot| slot.is_variadic())
    }

    /// Whether `count` tokens could fill this schema.
    pub fn accepts_count(&self, count: usize) -> bool {
        if self.has_variadic {
            count >= self.fixed_slots().len()
        } else {
            count == self.slots.len()
        }
    }
}
