//! Quote-aware message tokenizer.
//!
//! Splits raw message text into whitespace-delimited tokens while keeping
//! quoted runs together:
//!
//! - Unquoted whitespace separates tokens
//! - `"` and `'` both toggle quotation, so either one closes it
//! - A quote right after an unescaped backslash is kept as text, backslash included
//! - Empty tokens are never produced
//!
//! Three forms are offered: [`tokenize`] collects everything, [`Tokens`] is a
//! lazy iterator, and [`for_each_token`] drives a callback that may stop the
//! scan early by returning `false`.
//!
//! ```rust
//! use wayfarer_core::tokenizer::tokenize;
//!
//! assert_eq!(tokenize(r#"!ping "hello world" now"#), vec!["!ping", "hello world", "now"]);
//! ```

use std::iter::FusedIterator;
use std::str::Chars;

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    Tokens::new(input).collect()
}

/// Feeds tokens to `f` one at a time until the input is exhausted or `f`
/// returns `false`.
///
/// Returns `true` when every token was consumed, `false` when the callback
/// stopped the scan. Nothing after the stopping token is scanned.
pub fn for_each_token<F>(input: &str, mut f: F) -> bool
where
    F: FnMut(&str) -> bool,
{
    for token in Tokens::new(input) {
        if !f(&token) {
            return false;
        }
    }
    true
}

/// Lazy token stream over a message.
///
/// Each call to [`next`](Iterator::next) scans only as far as the end of the
/// next token, so dropping the iterator early leaves the rest of the input
/// untouched.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    chars: Chars<'a>,
}

impl<'a> Tokens<'a> {
    /// Creates a token stream over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut current = String::new();
        let mut quoted = false;
        // Set while the last character was a backslash that is not itself escaped.
        let mut escaped = false;

        for ch in self.chars.by_ref() {
            match ch {
                '"' | '\'' if !escaped => quoted = !quoted,
                c if c.is_whitespace() && !quoted => {
                    if !current.is_empty() {
                        return Some(current);
                    }
                }
                _ => current.push(ch),
            }
            escaped = ch == '\\' && !escaped;
        }

        // End of input; an unterminated quotation still yields what it holds.
        (!current.is_empty()).then_some(current)
    }
}

impl FusedIterator for Tokens<'_> {}
