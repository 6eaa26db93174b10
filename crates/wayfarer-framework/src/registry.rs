//! The command registry.
//!
//! Commands are kept in an immutable snapshot that is swapped as a whole on
//! every change. A dispatch clones the current `Arc` once and works with a
//! consistent view of both the commands and their name bounds, even while
//! commands are being added or removed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::command::Command;

/// Shortest and longest registered command name, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameBounds {
    pub min: usize,
    pub max: usize,
}

impl NameBounds {
    /// Whether a token of `len` characters could be `prefix_len` characters of
    /// prefix followed by a registered name.
    pub fn admits(&self, len: usize, prefix_len: usize) -> bool {
        (self.min + prefix_len..=self.max + prefix_len).contains(&len)
    }
}

/// An immutable view of the registered commands.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    commands: HashMap<String, Arc<Command>>,
    bounds: Option<NameBounds>,
}

impl RegistrySnapshot {
    fn new(commands: HashMap<String, Arc<Command>>) -> Self {
        let bounds = commands
            .keys()
            .map(|name| name.chars().count())
            .fold(None, |bounds: Option<NameBounds>, len| {
                Some(match bounds {
                    Some(b) => NameBounds {
                        min: b.min.min(len),
                        max: b.max.max(len),
                    },
                    None => NameBounds { min: len, max: len },
                })
            });
        Self { commands, bounds }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.get(name)
    }

    /// Name bounds, `None` while nothing is registered.
    pub fn bounds(&self) -> Option<NameBounds> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

/// Registered commands keyed by exact name.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Adds `command` unless its name is taken. Returns whether it was added.
    pub fn insert(&self, command: Arc<Command>) -> bool {
        let mut current = self.snapshot.write();
        if current.commands.contains_key(command.name()) {
            return false;
        }

        let mut commands = current.commands.clone();
        commands.insert(command.name().to_string(), command);
        *current = Arc::new(RegistrySnapshot::new(commands));
        true
    }

    /// Removes the command called `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<Command>> {
        let mut current = self.snapshot.write();
        let mut commands = current.commands.clone();
        let removed = commands.remove(name)?;
        *current = Arc::new(RegistrySnapshot::new(commands));
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.snapshot.read().get(name).cloned()
    }

    pub fn bounds(&self) -> Option<NameBounds> {
        self.snapshot.read().bounds()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}
