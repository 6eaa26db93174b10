//! Typed key/value storage attached to commands and dispatches.
//!
//! A command declares a static [`Store`] when it is built. Every dispatch
//! starts from a copy of it, so middleware can leave values for the handler
//! without touching the command itself.
//!
//! ```rust,ignore
//! let command = Command::builder("ban")
//!     .store("permission", "moderate")
//!     .handler(ban)
//!     .build();
//!
//! async fn require_permission(ctx: Arc<CommandContext>, stop: StopSignal) -> HandlerResult {
//!     let needed = ctx.store().get_text("permission")?;
//!     // ...
//! }
//! ```

use std::collections::HashMap;
use std::collections::hash_map;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// A value held in a [`Store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Anything else, kept as JSON.
    Json(Value),
}

impl StoreValue {
    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }

    /// Wraps any serializable value as JSON.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Self::Json)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for StoreValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i32 => Integer,
    i64 => Integer,
    u32 => Integer,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Value => Json,
}

/// String keys to [`StoreValue`]s with kind-checked reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    values: HashMap<String, StoreValue>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StoreValue>) -> Option<StoreValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&StoreValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<StoreValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, StoreValue> {
        self.values.iter()
    }

    fn require(&self, key: &str) -> StoreResult<&StoreValue> {
        self.values.get(key).ok_or_else(|| StoreError::absent(key))
    }

    pub fn get_text(&self, key: &str) -> StoreResult<&str> {
        match self.require(key)? {
            StoreValue::Text(text) => Ok(text),
            other => Err(StoreError::wrong_kind(key, "text", other.kind())),
        }
    }

    pub fn get_integer(&self, key: &str) -> StoreResult<i64> {
        match self.require(key)? {
            StoreValue::Integer(value) => Ok(*value),
            other => Err(StoreError::wrong_kind(key, "integer", other.kind())),
        }
    }

    pub fn get_float(&self, key: &str) -> StoreResult<f64> {
        match self.require(key)? {
            StoreValue::Float(value) => Ok(*value),
            other => Err(StoreError::wrong_kind(key, "float", other.kind())),
        }
    }

    pub fn get_boolean(&self, key: &str) -> StoreResult<bool> {
        match self.require(key)? {
            StoreValue::Boolean(value) => Ok(*value),
            other => Err(StoreError::wrong_kind(key, "boolean", other.kind())),
        }
    }

    pub fn get_json(&self, key: &str) -> StoreResult<&Value> {
        match self.require(key)? {
            StoreValue::Json(value) => Ok(value),
            other => Err(StoreError::wrong_kind(key, "json", other.kind())),
        }
    }

    /// Deserializes a JSON entry into `T`.
    ///
    /// A JSON entry that does not fit `T` is reported as a wrong kind.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        let value = self.get_json(key)?;
        T::deserialize(value).map_err(|_| StoreError::wrong_kind(key, std::any::type_name::<T>(), "json"))
    }
}

impl<K, V> FromIterator<(K, V)> for Store
where
    K: Into<String>,
    V: Into<StoreValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Store
where
    K: Into<String>,
    V: Into<StoreValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_reads() {
        let mut store = Store::new();
        store.insert("name", "wayfarer");
        store.insert("limit", 5);
        store.insert("ratio", 0.5);
        store.insert("enabled", true);

        assert_eq!(store.get_text("name"), Ok("wayfarer"));
        assert_eq!(store.get_integer("limit"), Ok(5));
        assert_eq!(store.get_float("ratio"), Ok(0.5));
        assert_eq!(store.get_boolean("enabled"), Ok(true));
    }

    #[test]
    fn test_absent_and_wrong_kind() {
        let store: Store = [("limit", 5)].into_iter().collect();

        assert_eq!(store.get_text("missing"), Err(StoreError::absent("missing")));
        assert_eq!(
            store.get_text("limit"),
            Err(StoreError::wrong_kind("limit", "text", "integer"))
        );
    }

    #[test]
    fn test_json_values() {
        #[derive(Debug, PartialEq, Deserialize, Serialize)]
        struct Cooldown {
            seconds: u32,
        }

        let mut store = Store::new();
        store.insert("cooldown", StoreValue::json(&Cooldown { seconds: 30 }).unwrap());
        store.insert("tags", json!(["a", "b"]));

        assert_eq!(store.get_as::<Cooldown>("cooldown"), Ok(Cooldown { seconds: 30 }));
        assert_eq!(store.get_json("tags"), Ok(&json!(["a", "b"])));
        assert!(matches!(
            store.get_as::<Cooldown>("tags"),
            Err(StoreError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_insert_replaces() {
        let mut store = Store::new();
        assert_eq!(store.insert("k", 1), None);
        assert_eq!(store.insert("k", "one"), Some(StoreValue::Integer(1)));
        assert_eq!(store.get_text("k"), Ok("one"));
        assert_eq!(store.len(), 1);
    }
}
