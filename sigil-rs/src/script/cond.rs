//! `if` condition grammar.
//!
//! ```text
//! cond  := token                      truthy when non-empty after expansion
//!        | "exists" path              path exists (relative to the session cwd)
//!        | left op right…             op ∈ == != < > <= >=
//! ```
//!
//! Operands are expanded as arguments.  When both sides parse as numbers the
//! comparison is numeric, otherwise it is a plain string comparison.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{ShellError, ShellResult};

use super::expand::Expander;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            "<" => CmpOp::Lt,
            ">" => CmpOp::Gt,
            "<=" => CmpOp::Le,
            ">=" => CmpOp::Ge,
            _ => return None,
        })
    }

    fn holds(self, ord: Option<Ordering>) -> bool {
        let Some(ord) = ord else {
            return self == CmpOp::Ne;
        };
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

/// Evaluate raw condition tokens.
pub fn evaluate(tokens: &[String], ex: &Expander<'_>, cwd: &Path) -> ShellResult<bool> {
    match tokens {
        [] => Err(ShellError::parse("if: empty condition")),
        [single] => Ok(!ex.expand_arg(single).is_empty()),
        [kw, path, ..] if kw == "exists" => {
            let target = ex.expand_arg(path);
            Ok(cwd.join(target).exists())
        }
        [left, op, right @ ..] if !right.is_empty() => {
            let op = CmpOp::parse(op)
                .ok_or_else(|| ShellError::parse(format!("if: unknown operator '{op}'")))?;
            let left = ex.expand_arg(left);
            let right: Vec<String> = right.iter().map(|t| ex.expand_arg(t)).collect();
            Ok(compare(&left, op, &right.join(" ")))
        }
        _ => Err(ShellError::parse(format!(
            "if: malformed condition '{}'",
            tokens.join(" ")
        ))),
    }
}

/// Compare two operand strings with `op`.
pub fn compare(left: &str, op: CmpOp, right: &str) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => op.holds(a.partial_cmp(&b)),
        _ => op.holds(Some(left.cmp(right))),
    }
}

fn as_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::AliasTable;
    use crate::script::lexer::tokenize;
    use crate::script::value::Value;
    use crate::var::VarStore;

    fn eval(src: &str, vars: &VarStore) -> ShellResult<bool> {
        let aliases = AliasTable::new();
        let ex = Expander::new(vars, &aliases);
        evaluate(&tokenize(src), &ex, Path::new("."))
    }

    #[test]
    fn numeric_comparison() {
        let vars = VarStore::new();
        assert!(eval("5 > 3", &vars).unwrap());
        assert!(eval("10 > 9", &vars).unwrap());
        assert!(eval("2.0 == 2", &vars).unwrap());
        assert!(!eval("1 >= 2", &vars).unwrap());
    }

    #[test]
    fn string_comparison() {
        let vars = VarStore::new();
        assert!(eval("abc < abd", &vars).unwrap());
        assert!(eval("\"bob\" != alice", &vars).unwrap());
    }

    #[test]
    fn variables_are_expanded() {
        let mut vars = VarStore::new();
        vars.set("name", Value::Str("bob".into()), false).unwrap();
        vars.set("n", Value::Int(7), false).unwrap();
        assert!(eval("name == \"bob\"", &vars).unwrap());
        assert!(eval("$n > 6", &vars).unwrap());
        assert!(eval("n <= 7", &vars).unwrap());
    }

    #[test]
    fn right_operand_joins_rest() {
        let mut vars = VarStore::new();
        vars.set("greeting", Value::Str("hello world".into()), false).unwrap();
        assert!(eval("greeting == hello world", &vars).unwrap());
    }

    #[test]
    fn lone_token_truthiness() {
        let mut vars = VarStore::new();
        vars.set("full", Value::Str("x".into()), false).unwrap();
        assert!(eval("$full", &vars).unwrap());
        assert!(!eval("$sigil_cond_test_unset_var", &vars).unwrap());
    }

    #[test]
    fn exists_form() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("here.txt"), "x").unwrap();
        let vars = VarStore::new();
        let aliases = AliasTable::new();
        let ex = Expander::new(&vars, &aliases);
        assert!(evaluate(&tokenize("exists here.txt"), &ex, dir.path()).unwrap());
        assert!(!evaluate(&tokenize("exists gone.txt"), &ex, dir.path()).unwrap());
    }

    #[test]
    fn malformed_conditions() {
        let vars = VarStore::new();
        assert!(eval("", &vars).is_err());
        assert!(eval("a b", &vars).is_err());
        assert!(eval("a ~ b", &vars).is_err());
    }
}
