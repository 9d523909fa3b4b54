//! Alias and variable expansion.
//!
//! Expansion runs on tokens produced by [`tokenize`]:
//!
//! | Token form          | Result                                               |
//! |---------------------|------------------------------------------------------|
//! | first token = alias | alias text + remaining tokens, re-expanded           |
//! | `'name'`            | value of `name` (store, environment), else `name`    |
//! | `"… $x …"`          | interior interpolated, re-emitted double-quoted      |
//! | `…$x…`              | interpolated in place                                |
//! | `name`              | stored value of `name` (store only)                  |
//! | anything else       | unchanged                                            |
//!
//! Interpolation recognises `$name` and `${name}`; both resolve against the
//! store, then the process environment, else the empty string.  A backslash
//! before `$ { } " \` emits that character literally; any other backslash is
//! kept so native path separators survive.

use log::trace;

use crate::macros::AliasTable;
use crate::var::VarLookup;

use super::lexer::{is_double_quoted, is_single_quoted, tokenize, unquote};

/// Default bound on alias re-expansion.
pub const DEFAULT_ALIAS_DEPTH: usize = 16;

/// Expansion context: variable lookups plus the alias table.
pub struct Expander<'a> {
    vars: &'a dyn VarLookup,
    aliases: &'a AliasTable,
    depth_limit: usize,
}

impl<'a> Expander<'a> {
    pub fn new(vars: &'a dyn VarLookup, aliases: &'a AliasTable) -> Self {
        Self { vars, aliases, depth_limit: DEFAULT_ALIAS_DEPTH }
    }

    /// Override the alias recursion limit.
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Expand a whole command line: aliases first, then every token.
    pub fn expand(&self, line: &str) -> String {
        let tokens = self.expand_aliases(tokenize(line));
        let out: Vec<String> = tokens.iter().map(|t| self.expand_token(t)).collect();
        out.join(" ")
    }

    /// Replace a leading alias name with its text, repeatedly.
    ///
    /// Stops silently once the depth limit is reached, so self-referencing or
    /// cyclic aliases terminate.
    pub fn expand_aliases(&self, mut tokens: Vec<String>) -> Vec<String> {
        for _ in 0..self.depth_limit {
            let Some(text) = tokens.first().and_then(|first| self.aliases.get(first)) else {
                break;
            };
            trace!("alias {} -> {}", tokens[0], text);
            let mut next = tokenize(text);
            next.extend(tokens.drain(1..));
            tokens = next;
        }
        tokens
    }

    /// Expand a single token, keeping any double quotes.
    pub fn expand_token(&self, token: &str) -> String {
        if is_single_quoted(token) {
            let inner = &token[1..token.len() - 1];
            return self.vars.lookup(inner).unwrap_or_else(|| inner.to_owned());
        }
        if is_double_quoted(token) {
            let inner = interpolate(&token[1..token.len() - 1], self.vars);
            return requote(&inner);
        }
        if token.contains('$') {
            return interpolate(token, self.vars);
        }
        self.vars.stored(token).unwrap_or_else(|| token.to_owned())
    }

    /// Expand a token for use as a command argument: expansion, then unquote.
    pub fn expand_arg(&self, token: &str) -> String {
        unquote(&self.expand_token(token))
    }
}

/// Substitute `$name` / `${name}` and process backslash escapes in `text`.
pub fn interpolate(text: &str, vars: &dyn VarLookup) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&(_, next)) if matches!(next, '$' | '{' | '}' | '"' | '\\') => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '$' => match chars.peek().map(|&(_, c)| c) {
                Some('{') => {
                    let body = &text[i + 2..];
                    match body.find('}') {
                        Some(close) => {
                            out.push_str(&resolve(&body[..close], vars));
                            // Skip `{`, the name and `}`.
                            let skip = body[..close].chars().count() + 2;
                            for _ in 0..skip {
                                chars.next();
                            }
                        }
                        // Unterminated brace stays literal.
                        None => out.push('$'),
                    }
                }
                Some(c) if is_ident_start(c) => {
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !is_ident_continue(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    out.push_str(&resolve(&name, vars));
                }
                _ => out.push('$'),
            },
            _ => out.push(ch),
        }
    }
    out
}

fn resolve(name: &str, vars: &dyn VarLookup) -> String {
    vars.lookup(name).unwrap_or_default()
}

/// Wrap already-interpolated text in double quotes, escaping `\` and `"`.
fn requote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Is `name` a valid variable identifier?
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if is_ident_start(c)) && chars.all(is_ident_continue)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
