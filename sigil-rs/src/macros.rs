//! User definitions: aliases and functions.
//!
//! An *alias* maps a name to a command-line template; when the first word of
//! a line names an alias, the template replaces it (see
//! [`expand`](crate::script::expand)).
//!
//! A *function* maps a name to an ordered list of command lines.  The `fn`
//! command defines one from a single line whose commands are separated by
//! the standalone token [`FN_SEPARATOR`]; `call` replays the body through
//! the interpreter.

use std::collections::HashMap;

use crate::script::lexer::tokenize;

/// Token that separates commands in a one-line function definition.
pub const FN_SEPARATOR: &str = ";;";

// ── AliasTable ────────────────────────────────────────────────────────────────

/// Alias name → expansion text.
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) an alias.
    pub fn define(&mut self, name: impl Into<String>, expansion: impl Into<String>) {
        self.aliases.insert(name.into(), expansion.into());
    }

    /// Remove an alias.  Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// All aliases sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut v: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        v.sort_by_key(|(k, _)| *k);
        v
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

// ── FunctionTable ─────────────────────────────────────────────────────────────

/// Function name → ordered command lines.
#[derive(Debug, Default, Clone)]
pub struct FunctionTable {
    functions: HashMap<String, Vec<String>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a function.
    pub fn define(&mut self, name: impl Into<String>, body: Vec<String>) {
        self.functions.insert(name.into(), body);
    }

    /// Remove a function.  Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// All functions sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &[String])> {
        let mut v: Vec<(&str, &[String])> = self
            .functions
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        v.sort_by_key(|(k, _)| *k);
        v
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Split raw definition tokens into command lines on [`FN_SEPARATOR`].
///
/// Empty commands (leading, trailing or doubled separators) are dropped.
pub fn split_body(tokens: &[String]) -> Vec<String> {
    tokens
        .split(|t| t == FN_SEPARATOR)
        .filter(|cmd| !cmd.is_empty())
        .map(|cmd| cmd.join(" "))
        .collect()
}

/// Render a body back into its one-line definition form.
pub fn join_body(body: &[String]) -> String {
    body.join(&format!(" {FN_SEPARATOR} "))
}

/// Split a one-line definition string (as stored in a profile) into commands.
pub fn split_body_str(text: &str) -> Vec<String> {
    split_body(&tokenize(text))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn alias_define_and_remove() {
        let mut aliases = AliasTable::new();
        aliases.define("ll", "dirlook");
        assert_eq!(aliases.get("ll"), Some("dirlook"));
        assert!(aliases.remove("ll"));
        assert!(!aliases.remove("ll"));
    }

    #[test]
    fn split_body_on_separator() {
        let body = split_body(&strings(&["say", "hi", ";;", "say", "\"a b\"", ";;"]));
        assert_eq!(body, vec!["say hi", "say \"a b\""]);
    }

    #[test]
    fn split_body_drops_empty_commands() {
        let body = split_body(&strings(&[";;", ";;", "pwd"]));
        assert_eq!(body, vec!["pwd"]);
    }

    #[test]
    fn join_round_trip_through_text() {
        let body = strings(&["say one", "rpt 2 say two"]);
        let text = join_body(&body);
        assert_eq!(text, "say one ;; rpt 2 say two");
        assert_eq!(split_body_str(&text), body);
    }

    #[test]
    fn functions_sorted() {
        let mut fns = FunctionTable::new();
        fns.define("b", vec!["pwd".into()]);
        fns.define("a", vec!["pwd".into()]);
        let names: Vec<&str> = fns.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
