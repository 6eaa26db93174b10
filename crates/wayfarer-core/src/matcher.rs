//! Positional matching of argument tokens against compiled grammars.
//!
//! Matching never fails with an error: a token list either fills a schema,
//! producing an [`ArgumentMap`], or it does not, producing a [`Mismatch`].
//!
//! ```rust,ignore
//! let schema = compile("ping", "[user:user] [*message:string]")?;
//! let mut cache = CoercionCache::new();
//! let args = match_arguments(&tokens, &schema, &mut cache)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::schema::{ArgumentSlot, ArgumentType, CompiledSchema};
use crate::value::{coerce_identifier, ArgumentValue, MessageLink};

/// Slot name to coerced value.
pub type ArgumentMap = HashMap<String, ArgumentValue>;

// ============================================================================
// Mismatch
// ============================================================================

/// Why a token list did not fill a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// The token count cannot fill the slots.
    Arity { expected: usize, variadic: bool, actual: usize },
    /// A token failed to coerce into its slot type.
    Coercion { slot: String, ty: ArgumentType, index: usize },
    /// An identifier slot saw a different word.
    Keyword { expected: String, index: usize },
    /// An earlier candidate cached this slot name under another type.
    CachedType { slot: String, cached: ArgumentType, wanted: ArgumentType },
}

/// A token list that does not fit a schema. A normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub reason: MismatchReason,
}

impl Mismatch {
    fn new(reason: MismatchReason) -> Self {
        Self { reason }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::Arity {
                expected,
                variadic: true,
                actual,
            } => write!(f, "expected at least {expected} tokens, got {actual}"),
            MismatchReason::Arity { expected, actual, .. } => {
                write!(f, "expected {expected} tokens, got {actual}")
            }
            MismatchReason::Coercion { slot, ty, index } => {
                write!(f, "token {index} is not a valid {ty} for '{slot}'")
            }
            MismatchReason::Keyword { expected, index } => {
                write!(f, "token {index} is not the keyword '{expected}'")
            }
            MismatchReason::CachedType { slot, cached, wanted } => {
                write!(f, "'{slot}' was already matched as {cached}, not {wanted}")
            }
        }
    }
}

// ============================================================================
// Coercion cache
// ============================================================================

#[derive(Debug, Clone)]
struct CachedCoercion {
    index: usize,
    ty: ArgumentType,
    value: ArgumentValue,
}

/// Coerced values remembered across the candidate grammars of one dispatch.
///
/// Entries are keyed by slot name. A hit only counts when it was coerced
/// from the same token position; a hit whose type disagrees with the slot
/// being tried rejects that candidate so declaration order decides.
#[derive(Debug, Default)]
pub struct CoercionCache {
    entries: HashMap<String, CachedCoercion>,
}

impl CoercionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn coerce(&mut self, slot: &ArgumentSlot, index: usize, token: &str) -> Result<ArgumentValue, Mismatch> {
        if let Some(hit) = self.entries.get(slot.name()) {
            if hit.ty != slot.ty() {
                return Err(Mismatch::new(MismatchReason::CachedType {
                    slot: slot.name().to_string(),
                    cached: hit.ty,
                    wanted: slot.ty(),
                }));
            }
            if hit.index == index {
                return Ok(hit.value.clone());
            }
        }

        let value = match slot.literal() {
            Some(keyword) => coerce_identifier(token, keyword).ok_or_else(|| {
                Mismatch::new(MismatchReason::Keyword {
                    expected: keyword.to_string(),
                    index,
                })
            })?,
            None => ArgumentValue::coerce(token, slot.ty()).ok_or_else(|| {
                Mismatch::new(MismatchReason::Coercion {
                    slot: slot.name().to_string(),
                    ty: slot.ty(),
                    index,
                })
            })?,
        };

        self.entries.insert(
            slot.name().to_string(),
            CachedCoercion {
                index,
                ty: slot.ty(),
                value: value.clone(),
            },
        );
        Ok(value)
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Fills `schema` from `tokens`.
///
/// Fixed slots take one token each in order. A trailing variadic slot joins
/// every remaining token with single spaces; with nothing left it is absent
/// from the map.
pub fn match_arguments(
    tokens: &[String],
    schema: &CompiledSchema,
    cache: &mut CoercionCache,
) -> Result<ArgumentMap, Mismatch> {
    if !schema.accepts_count(tokens.len()) {
        return Err(Mismatch::new(MismatchReason::Arity {
            expected: schema.fixed_slots().len(),
            variadic: schema.has_variadic(),
            actual: tokens.len(),
        }));
    }

    let fixed = schema.fixed_slots();
    let mut arguments = ArgumentMap::with_capacity(schema.slots().len());
    for (index, (slot, token)) in fixed.iter().zip(tokens).enumerate() {
        let value = cache.coerce(slot, index, token)?;
        arguments.insert(slot.name().to_string(), value);
    }

    if let Some(slot) = schema.variadic_slot() {
        let rest = &tokens[fixed.len()..];
        if !rest.is_empty() {
            arguments.insert(slot.name().to_string(), ArgumentValue::Text(rest.join(" ")));
        }
    }

    Ok(arguments)
}

/// The first schema in `candidates` that `tokens` fill, in declared order.
pub fn resolve<'a, I>(tokens: &[String], candidates: I, cache: &mut CoercionCache) -> Option<ResolvedSchema>
where
    I: IntoIterator<Item = &'a Arc<CompiledSchema>>,
{
    candidates.into_iter().find_map(|schema| {
        match match_arguments(tokens, schema, cache) {
            Ok(arguments) => Some(ResolvedSchema::new(Arc::clone(schema), arguments)),
            Err(mismatch) => {
                trace!(grammar = schema.source(), %mismatch, "Grammar rejected");
                None
            }
        }
    })
}

// ============================================================================
// Resolved schema
// ============================================================================

/// A grammar together with the values its slots matched.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    schema: Arc<CompiledSchema>,
    arguments: ArgumentMap,
}

macro_rules! typed_accessor {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&self, slot: &str) -> Option<$ty> {
            match self.arguments.get(slot)? {
                ArgumentValue::$variant(value) => Some(value.clone()),
                _ => None,
            }
        }
    };
}

impl ResolvedSchema {
    pub fn new(schema: Arc<CompiledSchema>, arguments: ArgumentMap) -> Self {
        Self { schema, arguments }
    }

    /// The grammar that matched.
    pub fn grammar(&self) -> &str {
        self.schema.source()
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    pub fn arguments(&self) -> &ArgumentMap {
        &self.arguments
    }

    pub fn get(&self, slot: &str) -> Option<&ArgumentValue> {
        self.arguments.get(slot)
    }

    /// Whether the bare keyword `word` was part of the matched grammar.
    pub fn has_identifier(&self, word: &str) -> bool {
        self.arguments
            .keys()
            .filter_map(|name| name.strip_prefix(crate::schema::IDENTIFIER_PREFIX))
            .any(|keyword| keyword.eq_ignore_ascii_case(word))
    }

    typed_accessor!(text, Text, String);
    typed_accessor!(integer, Integer, i32);
    typed_accessor!(long, Long, i64);
    typed_accessor!(boolean, Boolean, bool);
    typed_accessor!(float, Float, f32);
    typed_accessor!(double, Double, f64);
    typed_accessor!(
        /// The user id matched by a `user` slot.
        user, User, u64
    );
    typed_accessor!(channel, Channel, u64);
    typed_accessor!(role, Role, u64);
    typed_accessor!(custom_emoji, CustomEmoji, u64);
    typed_accessor!(message_link, Message, MessageLink);
}
