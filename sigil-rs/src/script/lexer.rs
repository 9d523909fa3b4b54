//! Tokenizer and comment stripper.
//!
//! Both are pure text transforms.  Quote handling is shared:
//!
//! - a double quote toggles the "inside quoted group" state;
//! - a backslash followed by `"` or `\` is an escape pair that is kept
//!   verbatim and never toggles the quote state.
//!
//! Comment markers:
//!
//! | Marker      | Kind                                           |
//! |-------------|------------------------------------------------|
//! | `&`         | single-line                                    |
//! | `#`         | single-line                                    |
//! | `//`        | single-line                                    |
//! | `/*` … `*/` | block, may span lines                          |
//!
//! Every marker is ignored inside a quoted group, including the block
//! opener.  Once a block comment is open, quotes no longer matter and only
//! `*/` closes it.

/// Split `line` on unquoted whitespace.
///
/// Quotes stay part of the token.  An unterminated quote keeps the partial
/// token, dangling quote included.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Strip comments from one line of script text.
///
/// `in_block` says whether a block comment is still open from a previous
/// line.  Returns the visible text (trimmed) and whether a block comment is
/// open at the end of this line.
pub fn strip_comments(line: &str, in_block: bool) -> (String, bool) {
    let mut out = String::with_capacity(line.len());
    let mut in_block = in_block;
    let mut in_quotes = false;
    let mut rest = line;

    loop {
        if in_block {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    in_block = false;
                }
                None => return (out.trim().to_owned(), true),
            }
        }

        let mut chars = rest.char_indices().peekable();
        let mut reopened = false;
        while let Some((i, c)) = chars.next() {
            let tail = &rest[i..];
            if c == '\\' && matches!(chars.peek(), Some((_, '"')) | Some((_, '\\'))) {
                out.push(c);
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
                continue;
            }
            if c == '"' {
                in_quotes = !in_quotes;
                out.push(c);
                continue;
            }
            if !in_quotes {
                if tail.starts_with("/*") {
                    rest = &rest[i + 2..];
                    in_block = true;
                    reopened = true;
                    break;
                }
                if c == '&' || c == '#' || tail.starts_with("//") {
                    return (out.trim().to_owned(), false);
                }
            }
            out.push(c);
        }
        if !reopened {
            return (out.trim().to_owned(), false);
        }
    }
}

/// Is `token` wrapped in double quotes?
pub fn is_double_quoted(token: &str) -> bool {
    if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
        return false;
    }
    // The closing quote must not itself be escaped.
    let body = &token[1..token.len() - 1];
    let trailing = body.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 0
}

/// Is `token` wrapped in single quotes?
pub fn is_single_quoted(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'')
}

/// Remove surrounding double quotes and undo `\"` / `\\` escapes.
///
/// Tokens that are not double-quoted are returned unchanged.
pub fn unquote(token: &str) -> String {
    if !is_double_quoted(token) {
        return token.to_owned();
    }
    let inner = &token[1..token.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('"') | Some('\\')) {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Wrap `text` in double quotes, escaping the characters that the expander
/// and tokenizer treat specially (`\`, `"`, `$`).
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Number of unescaped double quotes in `text` (odd means unmatched).
pub fn count_quotes(text: &str) -> usize {
    let mut n = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                chars.next();
            }
            '"' => n += 1,
            _ => {}
        }
    }
    n
}

// ── Tests ─────────────────────────────────────────────────────────────────────
