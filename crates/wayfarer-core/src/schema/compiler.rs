//! Grammar compiler.
//!
//! A grammar is a space-separated list of slot declarations:
//!
//! ```text
//! [name:type]      typed slot
//! [*name:string]   variadic slot, absorbs every remaining token
//! word             identifier slot, matched literally
//! ```
//!
//! Type keys are listed by [`ArgumentType::key`]. Whitespace inside brackets
//! is ignored; outside, slots are separated by exactly one space.

use super::types::{ArgumentSlot, ArgumentType, CompiledSchema};
use crate::error::{SchemaError, SchemaErrorKind, SchemaResult};

/// Compiles `grammar`, attributing any error to `command`.
///
/// # Example
///
/// ```rust
/// use wayfarer_core::schema::{ArgumentType, compile};
///
/// let schema = compile("ping", "[user:user] [*message:string]").unwrap();
/// assert_eq!(schema.slots()[0].ty(), ArgumentType::User);
/// assert!(schema.has_variadic());
/// ```
pub fn compile(command: &str, grammar: &str) -> SchemaResult<CompiledSchema> {
    compile_slots(grammar)
        .map(|slots| CompiledSchema::new(grammar.to_string(), slots))
        .map_err(|kind| SchemaError::new(command, kind))
}

fn compile_slots(grammar: &str) -> Result<Vec<ArgumentSlot>, SchemaErrorKind> {
    let mut collector = SlotCollector::default();
    let mut enclosure: Option<Enclosure> = None;
    let mut word = String::new();
    let mut previous: Option<char> = None;
    let mut length = 0;

    for (position, ch) in grammar.chars().enumerate() {
        length = position + 1;

        if enclosure.is_some() {
            if ch == ']' {
                if let Some(open) = enclosure.take() {
                    collector.push_typed(open)?;
                }
            } else if let Some(open) = enclosure.as_mut() {
                open.feed(position, ch)?;
            }
            previous = Some(ch);
            continue;
        }

        match ch {
            '[' => {
                if !word.is_empty() || previous == Some(']') {
                    return Err(SchemaErrorKind::MissingSeparator { position });
                }
                enclosure = Some(Enclosure::open(position));
            }
            ']' => return Err(SchemaErrorKind::UnmatchedClose { position }),
            ':' => return Err(SchemaErrorKind::MisplacedColon { position }),
            c if c.is_whitespace() => {
                match previous {
                    None => return Err(SchemaErrorKind::StraySeparator { position }),
                    Some(p) if p.is_whitespace() => {
                        return Err(SchemaErrorKind::DoubleSpace { position });
                    }
                    _ => {}
                }
                if !word.is_empty() {
                    collector.push_identifier(&word)?;
                    word.clear();
                }
            }
            c => {
                if previous == Some(']') {
                    return Err(SchemaErrorKind::MissingSeparator { position });
                }
                word.push(c);
            }
        }
        previous = Some(ch);
    }

    if let Some(open) = enclosure {
        return Err(SchemaErrorKind::UnclosedBracket {
            position: open.start,
        });
    }
    if previous.is_some_and(char::is_whitespace) {
        return Err(SchemaErrorKind::StraySeparator {
            position: length - 1,
        });
    }
    if !word.is_empty() {
        collector.push_identifier(&word)?;
    }
    if collector.slots.is_empty() {
        return Err(SchemaErrorKind::NoSlots);
    }

    Ok(collector.slots)
}

/// A `[...]` declaration being read.
struct Enclosure {
    start: usize,
    name: String,
    /// `None` until the `:` has been seen.
    type_name: Option<String>,
}

impl Enclosure {
    fn open(start: usize) -> Self {
        Self {
            start,
            name: String::new(),
            type_name: None,
        }
    }

    fn feed(&mut self, position: usize, ch: char) -> Result<(), SchemaErrorKind> {
        match ch {
            '[' => Err(SchemaErrorKind::NestedBracket { position }),
            ':' if self.name.is_empty() || self.type_name.is_some() => {
                Err(SchemaErrorKind::MisplacedColon { position })
            }
            ':' => {
                self.type_name = Some(String::new());
                Ok(())
            }
            c if c.is_whitespace() => Ok(()),
            c => {
                match &mut self.type_name {
                    Some(type_name) => type_name.push(c),
                    None => self.name.push(c),
                }
                Ok(())
            }
        }
    }
}

#[derive(Default)]
struct SlotCollector {
    slots: Vec<ArgumentSlot>,
    variadic: Option<String>,
}

impl SlotCollector {
    fn push_typed(&mut self, open: Enclosure) -> Result<(), SchemaErrorKind> {
        let (name, variadic) = match open.name.strip_prefix('*') {
            Some(stripped) => (stripped.to_string(), true),
            None => (open.name, false),
        };
        if name.is_empty() {
            return Err(SchemaErrorKind::EmptyName {
                position: open.start,
            });
        }

        let type_name = match open.type_name {
            Some(type_name) if !type_name.is_empty() => type_name,
            _ => return Err(SchemaErrorKind::MissingType { name }),
        };
        let ty = ArgumentType::from_key(&type_name).ok_or_else(|| SchemaErrorKind::UnknownType {
            name: name.clone(),
            type_name: type_name.clone(),
        })?;
        if ty == ArgumentType::Identifier {
            return Err(SchemaErrorKind::ReservedType { name, type_name });
        }

        if let Some(existing) = &self.variadic {
            return Err(if variadic {
                SchemaErrorKind::MultipleVariadic {
                    name,
                    existing: existing.clone(),
                }
            } else {
                SchemaErrorKind::SlotAfterVariadic {
                    name,
                    variadic: existing.clone(),
                }
            });
        }
        if variadic && ty != ArgumentType::Text {
            return Err(SchemaErrorKind::VariadicNotText { name });
        }

        self.ensure_unique(&name)?;
        if variadic {
            self.variadic = Some(name.clone());
        }
        self.slots.push(ArgumentSlot::typed(name, ty, variadic));
        Ok(())
    }

    fn push_identifier(&mut self, word: &str) -> Result<(), SchemaErrorKind> {
        if let Some(existing) = &self.variadic {
            return Err(SchemaErrorKind::SlotAfterVariadic {
                name: word.to_string(),
                variadic: existing.clone(),
            });
        }
        let slot = ArgumentSlot::identifier(word);
        self.ensure_unique(slot.name())?;
        self.slots.push(slot);
        Ok(())
    }

    fn ensure_unique(&self, name: &str) -> Result<(), SchemaErrorKind> {
        if self.slots.iter().any(|slot| slot.name() == name) {
            return Err(SchemaErrorKind::DuplicateSlot {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(grammar: &str) -> SchemaErrorKind {
        compile("test", grammar).unwrap_err().kind
    }

    #[test]
    fn test_compile_typed_and_variadic() {
        let schema = compile("ping", "[user:user] [*message:string]").unwrap();

        assert_eq!(schema.slots().len(), 2);
        assert_eq!(schema.slots()[0].name(), "user");
        assert_eq!(schema.slots()[0].ty(), ArgumentType::User);
        assert!(!schema.slots()[0].is_variadic());
        assert_eq!(schema.slots()[1].name(), "message");
        assert_eq!(schema.slots()[1].ty(), ArgumentType::Text);
        assert!(schema.slots()[1].is_variadic());
        assert!(schema.has_variadic());
        assert_eq!(schema.source(), "[user:user] [*message:string]");
    }

    #[test]
    fn test_compile_identifier_slots() {
        let schema = compile("ping", "channel [channel:channel]").unwrap();

        assert_eq!(schema.slots()[0].name(), "identifier:channel");
        assert_eq!(schema.slots()[0].ty(), ArgumentType::Identifier);
        assert_eq!(schema.slots()[0].literal(), Some("channel"));
        assert_eq!(schema.slots()[1].ty(), ArgumentType::Channel);
        assert!(!schema.has_variadic());
    }

    #[test]
    fn test_compile_single_identifier() {
        let schema = compile("cfg", "reset").unwrap();
        assert_eq!(schema.slots().len(), 1);
        assert_eq!(schema.slots()[0].literal(), Some("reset"));
    }

    #[test]
    fn test_compile_all_types() {
        let schema = compile(
            "all",
            "[a:user] [b:channel] [c:role] [d:message] [e:emoji] [f:string] \
             [g:int] [h:long] [i:boolean] [j:float] [k:double]",
        )
        .unwrap();
        let types: Vec<_> = schema.slots().iter().map(ArgumentSlot::ty).collect();
        assert_eq!(&types[..], &ArgumentType::ALL[..11]);
    }

    #[test]
    fn test_compile_ignores_case_and_inner_whitespace() {
        let schema = compile("t", "[ count : INT ]").unwrap();
        assert_eq!(schema.slots()[0].name(), "count");
        assert_eq!(schema.slots()[0].ty(), ArgumentType::Integer);
    }

    #[test]
    fn test_error_names_owner() {
        let err = compile("ping", "[x:bogus]").unwrap_err();
        assert_eq!(err.command, "ping");
        assert!(err.to_string().contains("ping"));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(kind("[x:bogus]"), SchemaErrorKind::UnknownType { .. }));
    }

    #[test]
    fn test_reserved_type() {
        assert!(matches!(kind("[x:identifier]"), SchemaErrorKind::ReservedType { .. }));
    }

    #[test]
    fn test_multiple_variadic() {
        assert!(matches!(
            kind("[*a:string] [*b:string]"),
            SchemaErrorKind::MultipleVariadic { .. }
        ));
    }

    #[test]
    fn test_variadic_not_text() {
        assert!(matches!(kind("[*n:int]"), SchemaErrorKind::VariadicNotText { .. }));
    }

    #[test]
    fn test_slot_after_variadic() {
        assert!(matches!(
            kind("[*rest:string] [n:int]"),
            SchemaErrorKind::SlotAfterVariadic { .. }
        ));
        assert!(matches!(
            kind("[*rest:string] word"),
            SchemaErrorKind::SlotAfterVariadic { .. }
        ));
    }

    #[test]
    fn test_empty_grammar() {
        assert_eq!(kind(""), SchemaErrorKind::NoSlots);
    }

    #[test]
    fn test_bracket_errors() {
        assert_eq!(kind("[a:[b:int]]"), SchemaErrorKind::NestedBracket { position: 3 });
        assert_eq!(kind("a:int]"), SchemaErrorKind::MisplacedColon { position: 1 });
        assert_eq!(kind("word]"), SchemaErrorKind::UnmatchedClose { position: 4 });
        assert_eq!(kind("[a:int"), SchemaErrorKind::UnclosedBracket { position: 0 });
    }

    #[test]
    fn test_colon_errors() {
        assert_eq!(kind("[:int]"), SchemaErrorKind::MisplacedColon { position: 1 });
        assert_eq!(kind("[a:int:x]"), SchemaErrorKind::MisplacedColon { position: 6 });
    }

    #[test]
    fn test_missing_parts() {
        assert!(matches!(kind("[a]"), SchemaErrorKind::MissingType { .. }));
        assert!(matches!(kind("[a:]"), SchemaErrorKind::MissingType { .. }));
        assert_eq!(kind("[]"), SchemaErrorKind::EmptyName { position: 0 });
        assert_eq!(kind("[*:string]"), SchemaErrorKind::EmptyName { position: 0 });
    }

    #[test]
    fn test_separator_errors() {
        assert_eq!(kind("[a:int]  [b:int]"), SchemaErrorKind::DoubleSpace { position: 8 });
        assert_eq!(kind(" [a:int]"), SchemaErrorKind::StraySeparator { position: 0 });
        assert_eq!(kind("[a:int] "), SchemaErrorKind::StraySeparator { position: 7 });
        assert_eq!(kind("[a:int][b:int]"), SchemaErrorKind::MissingSeparator { position: 7 });
        assert_eq!(kind("[a:int]b"), SchemaErrorKind::MissingSeparator { position: 7 });
        assert_eq!(kind("b[a:int]"), SchemaErrorKind::MissingSeparator { position: 1 });
    }

    #[test]
    fn test_duplicate_slot() {
        assert!(matches!(kind("[a:int] [a:long]"), SchemaErrorKind::DuplicateSlot { .. }));
        assert!(matches!(kind("add add"), SchemaErrorKind::DuplicateSlot { .. }));
    }
}
