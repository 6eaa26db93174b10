//! Memoized grammar compilation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::compiler::compile;
use super::types::CompiledSchema;
use crate::error::SchemaResult;

/// Compiled schemas keyed by their exact grammar string.
///
/// Two grammars that differ only in spelling are cached separately. Entries
/// are published as complete `Arc`s under the write lock, so readers never
/// observe a half-built schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Arc<CompiledSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached schema for `grammar`, if compiled before.
    pub fn get(&self, grammar: &str) -> Option<Arc<CompiledSchema>> {
        self.entries.read().get(grammar).cloned()
    }

    /// Returns the cached schema for `grammar`, compiling it on a miss.
    ///
    /// Compilation happens outside the lock; when two callers race on the
    /// same grammar the first insert wins and both receive that entry.
    pub fn get_or_compile(&self, command: &str, grammar: &str) -> SchemaResult<Arc<CompiledSchema>> {
        if let Some(schema) = self.get(grammar) {
            return Ok(schema);
        }

        let compiled = Arc::new(compile(command, grammar)?);
        trace!(command, grammar, slots = compiled.slots().len(), "Compiled grammar");

        let mut entries = self.entries.write();
        Ok(Arc::clone(
            entries.entry(grammar.to_string()).or_insert(compiled),
        ))
    }

    /// Compiles every grammar in `grammars`, stopping at the first failure.
    ///
    /// Grammars compiled before the failure stay cached.
    pub fn load<I, S>(&self, command: &str, grammars: I) -> SchemaResult<Vec<Arc<CompiledSchema>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        grammars
            .into_iter()
            .map(|grammar| self.get_or_compile(command, grammar.as_ref()))
            .collect()
    }

    /// Drops the entry for `grammar`.
    pub fn evict(&self, grammar: &str) -> bool {
        self.entries.write().remove(grammar).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;

    #[test]
    fn test_cache_reuses_entries() {
        let cache = SchemaCache::new();
        let first = cache.get_or_compile("a", "[n:int]").unwrap();
        let second = cache.get_or_compile("b", "[n:int]").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_by_exact_source() {
        let cache = SchemaCache::new();
        cache.get_or_compile("a", "[n:int]").unwrap();
        cache.get_or_compile("a", "[n:INT]").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_compile_is_not_cached() {
        let cache = SchemaCache::new();
        let err = cache.get_or_compile("bad", "[n:nope]").unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::UnknownType { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_stops_on_first_error() {
        let cache = SchemaCache::new();
        let result = cache.load("cmd", ["[a:int]", "[b:bogus]", "[c:long]"]);
        assert!(result.is_err());
        assert!(cache.get("[a:int]").is_some());
        assert!(cache.get("[c:long]").is_none());
    }

    #[test]
    fn test_evict() {
        let cache = SchemaCache::new();
        cache.get_or_compile("a", "go").unwrap();
        assert!(cache.evict("go"));
        assert!(!cache.evict("go"));
        assert!(cache.is_empty());
    }
}
