use proptest::prelude::*;
use sigil::macros::AliasTable;
use sigil::script::expand::{interpolate, Expander};
use sigil::script::lexer::{count_quotes, quote, strip_comments, tokenize};
use sigil::script::ScriptBuffer;
use sigil::var::VarStore;

proptest! {
    /// Without quotes or escapes, tokenizing is plain whitespace splitting.
    #[test]
    fn tokenize_matches_whitespace_split(s in "[a-z0-9_. \t]{0,60}") {
        let expected: Vec<String> = s.split_whitespace().map(str::to_owned).collect();
        prop_assert_eq!(tokenize(&s), expected);
    }

    /// Tokens are never empty.
    #[test]
    fn tokens_are_never_empty(s in "\\PC{0,80}") {
        prop_assert!(tokenize(&s).iter().all(|t| !t.is_empty()));
    }

    /// A quoted string is always a single token.
    #[test]
    fn quoted_text_is_one_token(s in "\\PC{0,40}") {
        prop_assert_eq!(tokenize(&quote(&s)).len(), 1);
    }

    /// Quoting protects text from interpolation.
    #[test]
    fn quoted_text_survives_interpolation(s in "[a-z ${}\\\\\"]{0,30}") {
        let q = quote(&s);
        let vars = VarStore::new();
        prop_assert_eq!(interpolate(&q[1..q.len() - 1], &vars), s);
    }

    /// Quote counts of quoted text are balanced.
    #[test]
    fn quoted_text_has_even_quote_count(s in "\\PC{0,40}") {
        prop_assert_eq!(count_quotes(&quote(&s)) % 2, 0);
    }

    /// Lines without comment markers come back trimmed and unchanged.
    #[test]
    fn strip_comments_leaves_plain_text(s in "[a-z0-9 =]{0,60}") {
        prop_assert_eq!(strip_comments(&s, false), (s.trim().to_owned(), false));
    }

    /// Inside an open block comment nothing survives until `*/`.
    #[test]
    fn open_block_hides_text(s in "[a-z0-9 \"#&]{0,40}") {
        prop_assert_eq!(strip_comments(&s, true), (String::new(), true));
    }

    /// Text without `$` or `\` passes through interpolation untouched.
    #[test]
    fn interpolate_without_markers_is_identity(s in "[a-zA-Z0-9 .,:;]{0,60}") {
        let vars = VarStore::new();
        prop_assert_eq!(interpolate(&s, &vars), s);
    }

    /// Cyclic aliases always terminate.
    #[test]
    fn alias_cycles_terminate(depth in 1usize..64, rest in "[a-z ]{0,20}") {
        let mut aliases = AliasTable::new();
        aliases.define("ping", "pong");
        aliases.define("pong", "ping");
        let vars = VarStore::new();
        let expander = Expander::new(&vars, &aliases).with_depth_limit(depth);
        let line = format!("ping {rest}");
        let out = expander.expand(&line);
        prop_assert!(out.starts_with("ping") || out.starts_with("pong"));
    }

    /// The script parser never panics.
    #[test]
    fn parser_does_not_panic(s in "\\PC{0,200}") {
        let _ = ScriptBuffer::parse(&s);
    }
}
