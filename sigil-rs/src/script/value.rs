//! Runtime value type for Sigil variables.
//!
//! Sigil is dynamically typed.  `let` stores integers and floats when the
//! text looks numeric and falls back to strings otherwise; everything is
//! stringified again when substituted into a command line.

use std::fmt;

/// A variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Whole floats keep one decimal so they stay distinguishable.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    /// Interpret literal text the way `let` does.
    ///
    /// Text containing `.` or `e`/`E` is tried as a float, anything else as an
    /// integer; text that fails to parse stays a string.
    pub fn parse_literal(text: &str) -> Value {
        let looks_float = text.contains('.') || text.contains(['e', 'E']);
        if looks_float {
            // Rust accepts "inf"/"nan" spellings that are not meant as numbers here.
            let alpha = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
            if alpha <= 1 {
                if let Ok(x) = text.parse::<f64>() {
                    return Value::Float(x);
                }
            }
        } else if let Ok(n) = text.parse::<i64>() {
            return Value::Int(n);
        }
        Value::Str(text.to_owned())
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Str(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        }
    }

    /// Name of the type, as shown by `var`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// Fold `operands` left to right with `op`.
    ///
    /// Integers stay integers until a float enters the chain; a float result
    /// with no fractional part collapses back to an integer.
    pub fn fold(op: ArithOp, operands: &[Value]) -> Result<Value, String> {
        let mut iter = operands.iter();
        let first = iter.next().ok_or_else(|| "no operands".to_owned())?;
        let mut acc = match op {
            // Division always runs in floating point.
            ArithOp::Div => Value::Float(first.as_number().unwrap_or(0.0)),
            _ => first.clone(),
        };
        for rhs in iter {
            acc = match (&acc, rhs, op) {
                (Value::Int(a), Value::Int(b), ArithOp::Add) => int_or_float(a.checked_add(*b), *a as f64 + *b as f64),
                (Value::Int(a), Value::Int(b), ArithOp::Sub) => int_or_float(a.checked_sub(*b), *a as f64 - *b as f64),
                (Value::Int(a), Value::Int(b), ArithOp::Mul) => int_or_float(a.checked_mul(*b), *a as f64 * *b as f64),
                _ => {
                    let a = acc.as_number().unwrap_or(0.0);
                    let b = rhs.as_number().unwrap_or(0.0);
                    Value::Float(match op {
                        ArithOp::Add => a + b,
                        ArithOp::Sub => a - b,
                        ArithOp::Mul => a * b,
                        ArithOp::Div => {
                            if b == 0.0 {
                                return Err("division by zero".to_owned());
                            }
                            a / b
                        }
                    })
                }
            };
        }
        Ok(match acc {
            Value::Float(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => Value::Int(x as i64),
            other => other,
        })
    }
}

/// Binary arithmetic operator for [`Value::fold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

fn int_or_float(checked: Option<i64>, wide: f64) -> Value {
    checked.map(Value::Int).unwrap_or(Value::Float(wide))
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_int() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Int(-7).to_string(), "-7");
    }

    #[test]
    fn display_float() {
        assert_eq!(Value::Float(3.25).to_string(), "3.25");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
    }

    #[test]
    fn parse_literal_kinds() {
        assert_eq!(Value::parse_literal("5"), Value::Int(5));
        assert_eq!(Value::parse_literal("-12"), Value::Int(-12));
        assert_eq!(Value::parse_literal("2.5"), Value::Float(2.5));
        assert_eq!(Value::parse_literal("1e3"), Value::Float(1000.0));
        assert_eq!(Value::parse_literal("hello"), Value::Str("hello".into()));
        assert_eq!(Value::parse_literal("inf"), Value::Str("inf".into()));
        assert_eq!(Value::parse_literal("infinite"), Value::Str("infinite".into()));
        assert_eq!(Value::parse_literal(""), Value::Str(String::new()));
    }

    #[test]
    fn as_number() {
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Str(" 4.5 ".into()).as_number(), Some(4.5));
        assert_eq!(Value::Str("abc".into()).as_number(), None);
        assert_eq!(Value::Str("nan".into()).as_number(), None);
    }

    #[test]
    fn fold_integers() {
        let ops = [Value::Int(10), Value::Int(3), Value::Int(2)];
        assert_eq!(Value::fold(ArithOp::Add, &ops), Ok(Value::Int(15)));
        assert_eq!(Value::fold(ArithOp::Sub, &ops), Ok(Value::Int(5)));
        assert_eq!(Value::fold(ArithOp::Mul, &ops), Ok(Value::Int(60)));
    }

    #[test]
    fn fold_division() {
        let ops = [Value::Int(9), Value::Int(2)];
        assert_eq!(Value::fold(ArithOp::Div, &ops), Ok(Value::Float(4.5)));
        let ops = [Value::Int(8), Value::Int(2)];
        assert_eq!(Value::fold(ArithOp::Div, &ops), Ok(Value::Int(4)));
        let ops = [Value::Int(1), Value::Int(0)];
        assert!(Value::fold(ArithOp::Div, &ops).is_err());
    }

    #[test]
    fn fold_float_promotion() {
        let ops = [Value::Int(1), Value::Float(0.5)];
        assert_eq!(Value::fold(ArithOp::Add, &ops), Ok(Value::Float(1.5)));
        let ops = [Value::Float(0.5), Value::Float(0.5)];
        assert_eq!(Value::fold(ArithOp::Add, &ops), Ok(Value::Int(1)));
    }
}
