//! Script buffers: comment-stripped lines, keyword classification, labels
//! and block ranges.
//!
//! A [`ScriptBuffer`] is built once per script text (file, function body,
//! REPL entry).  Building it strips comments (carrying block-comment state
//! across lines), tokenizes every line and scans the whole buffer once for
//! labels.  Block ranges (`rpt … endrpt`, `case … endcase`) are not stored;
//! the interpreter asks for them on demand by depth-counting.
//!
//! Labels are scoped to the innermost block body that contains them:
//!
//! - the top level of the buffer (scope `None`);
//! - an `rpt` block body (scope = index of the `rpt` line);
//! - a `case` clause body (scope = index of the `when`/`else` header, or of
//!   the `case` line for anything before the first clause).
//!
//! The same name may appear in different scopes; a duplicate within one
//! scope is a parse error.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ShellError, ShellResult};

use super::lexer::{strip_comments, tokenize};

// ── Keywords ──────────────────────────────────────────────────────────────────

/// Reserved control words, recognised on the raw first token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Goto,
    Rpt,
    EndRpt,
    Case,
    When,
    Else,
    EndCase,
    If,
    Break,
}

impl Keyword {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "goto" => Keyword::Goto,
            "rpt" => Keyword::Rpt,
            "endrpt" => Keyword::EndRpt,
            "case" => Keyword::Case,
            "when" => Keyword::When,
            "else" => Keyword::Else,
            "endcase" => Keyword::EndCase,
            "if" => Keyword::If,
            "break" => Keyword::Break,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Goto => "goto",
            Keyword::Rpt => "rpt",
            Keyword::EndRpt => "endrpt",
            Keyword::Case => "case",
            Keyword::When => "when",
            Keyword::Else => "else",
            Keyword::EndCase => "endcase",
            Keyword::If => "if",
            Keyword::Break => "break",
        }
    }
}

/// Every reserved word, for `help` and `schk`.
pub const KEYWORDS: [Keyword; 9] = [
    Keyword::Goto,
    Keyword::Rpt,
    Keyword::EndRpt,
    Keyword::Case,
    Keyword::When,
    Keyword::Else,
    Keyword::EndCase,
    Keyword::If,
    Keyword::Break,
];

fn label_regex() -> Option<&'static Regex> {
    static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
    LABEL
        .get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*):$").ok())
        .as_ref()
}

/// If `text` is a label line (`name:`), return the label name.
pub fn label_name(text: &str) -> Option<&str> {
    let caps = label_regex()?.captures(text)?;
    caps.get(1).map(|m| m.as_str())
}

// ── Line ──────────────────────────────────────────────────────────────────────

/// One comment-stripped line of a buffer.
#[derive(Debug, Clone)]
pub struct Line {
    /// Visible text after comment stripping (may be empty).
    pub text: String,
    /// Raw (unexpanded) tokens of `text`.
    pub tokens: Vec<String>,
    /// 1-based line number in the source text.
    pub number: usize,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Keyword named by the first raw token, if any.
    pub fn keyword(&self) -> Option<Keyword> {
        self.tokens.first().and_then(|t| Keyword::from_token(t))
    }

    /// `rpt` with at most a count: the body follows on later lines.
    pub fn opens_rpt_block(&self) -> bool {
        self.keyword() == Some(Keyword::Rpt) && self.tokens.len() <= 2
    }

    pub fn label(&self) -> Option<&str> {
        label_name(&self.text)
    }
}

// ── Case clauses ──────────────────────────────────────────────────────────────

/// One `when` or `else` clause of a `case` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Index of the `when`/`else` header line.
    pub header: usize,
    /// Raw value tokens of a `when`; `None` for `else`.
    pub values: Option<Vec<String>>,
    /// Line range of the clause body.
    pub body: Range<usize>,
}

// ── ScriptBuffer ──────────────────────────────────────────────────────────────

/// A parsed script buffer.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuffer {
    lines: Vec<Line>,
    labels: HashMap<(Option<usize>, String), usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Open {
    Rpt,
    Case,
}

impl ScriptBuffer {
    /// Build a buffer from script text.
    pub fn parse(text: &str) -> ShellResult<Self> {
        Self::from_lines(text.lines())
    }

    /// Build a buffer from individual lines.
    pub fn from_lines<I, S>(lines: I) -> ShellResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut in_block = false;
        let mut out = Vec::new();
        for (i, raw) in lines.into_iter().enumerate() {
            let (text, still_open) = strip_comments(raw.as_ref(), in_block);
            in_block = still_open;
            let tokens = tokenize(&text);
            out.push(Line { text, tokens, number: i + 1 });
        }
        let labels = scan_labels(&out)?;
        Ok(Self { lines: out, labels })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Resume index for label `name` in `scope`.
    pub fn label(&self, scope: Option<usize>, name: &str) -> Option<usize> {
        self.labels.get(&(scope, name.to_owned())).copied()
    }

    /// Index of the `endrpt` matching the block `rpt` at `start`.
    pub fn find_rpt_end(&self, start: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, line) in self.lines.iter().enumerate().skip(start + 1) {
            if line.opens_rpt_block() {
                depth += 1;
            } else if line.keyword() == Some(Keyword::EndRpt) {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
        }
        None
    }

    /// Index of the `endcase` matching the `case` at `start`.
    pub fn find_case_end(&self, start: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, line) in self.lines.iter().enumerate().skip(start + 1) {
            match line.keyword() {
                Some(Keyword::Case) => depth += 1,
                Some(Keyword::EndCase) if depth == 0 => return Some(i),
                Some(Keyword::EndCase) => depth -= 1,
                _ => {}
            }
        }
        None
    }

    /// Clauses of the `case` at `start` whose `endcase` is at `end`.
    ///
    /// Only headers at the case's own nesting level count; an `else` ends
    /// clause collection (anything after it belongs to its body).
    pub fn case_clauses(&self, start: usize, end: usize) -> Vec<Clause> {
        let mut clauses: Vec<Clause> = Vec::new();
        let mut depth = 0usize;
        let mut seen_else = false;
        for i in start + 1..end.min(self.lines.len()) {
            let line = &self.lines[i];
            let kw = line.keyword();
            match kw {
                Some(Keyword::Case) => depth += 1,
                Some(Keyword::EndCase) => depth = depth.saturating_sub(1),
                Some(Keyword::When) | Some(Keyword::Else) if depth == 0 && !seen_else => {
                    if let Some(prev) = clauses.last_mut() {
                        prev.body.end = i;
                    }
                    let values = if kw == Some(Keyword::When) {
                        Some(line.tokens[1..].to_vec())
                    } else {
                        seen_else = true;
                        None
                    };
                    clauses.push(Clause { header: i, values, body: i + 1..end });
                }
                _ => {}
            }
        }
        clauses
    }

    /// Blocks opened but not closed by the end of the buffer.
    pub fn open_blocks(&self) -> usize {
        let mut stack = Vec::new();
        for line in &self.lines {
            match line.keyword() {
                Some(Keyword::Rpt) if line.opens_rpt_block() => stack.push(Open::Rpt),
                Some(Keyword::Case) => stack.push(Open::Case),
                Some(Keyword::EndRpt) if stack.last() == Some(&Open::Rpt) => {
                    stack.pop();
                }
                Some(Keyword::EndCase) if stack.last() == Some(&Open::Case) => {
                    stack.pop();
                }
                _ => {}
            }
        }
        stack.len()
    }

    /// Closing keywords with no matching opener, as 1-based line numbers.
    pub fn stray_closers(&self) -> Vec<(usize, Keyword)> {
        let mut stack = Vec::new();
        let mut stray = Vec::new();
        for line in &self.lines {
            match line.keyword() {
                Some(Keyword::Rpt) if line.opens_rpt_block() => stack.push(Open::Rpt),
                Some(Keyword::Case) => stack.push(Open::Case),
                Some(kw @ Keyword::EndRpt) => {
                    if stack.last() == Some(&Open::Rpt) {
                        stack.pop();
                    } else {
                        stray.push((line.number, kw));
                    }
                }
                Some(kw @ Keyword::EndCase) => {
                    if stack.last() == Some(&Open::Case) {
                        stack.pop();
                    } else {
                        stray.push((line.number, kw));
                    }
                }
                _ => {}
            }
        }
        stray
    }
}

fn scan_labels(lines: &[Line]) -> ShellResult<HashMap<(Option<usize>, String), usize>> {
    let mut labels = HashMap::new();
    // (opener kind, scope id)
    let mut scopes: Vec<(Open, usize)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        match line.keyword() {
            Some(Keyword::Rpt) if line.opens_rpt_block() => scopes.push((Open::Rpt, i)),
            Some(Keyword::EndRpt) if matches!(scopes.last(), Some((Open::Rpt, _))) => {
                scopes.pop();
            }
            Some(Keyword::Case) => scopes.push((Open::Case, i)),
            Some(Keyword::When) | Some(Keyword::Else) => {
                if let Some((Open::Case, id)) = scopes.last_mut() {
                    *id = i;
                }
            }
            Some(Keyword::EndCase) if matches!(scopes.last(), Some((Open::Case, _))) => {
                scopes.pop();
            }
            _ => {}
        }
        if let Some(name) = line.label() {
            let scope = scopes.last().map(|(_, id)| *id);
            if labels.insert((scope, name.to_owned()), i + 1).is_some() {
                return Err(ShellError::parse(format!(
                    "line {}: duplicate label '{name}'",
                    line.number
                )));
            }
        }
    }
    Ok(labels)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
