//! Error taxonomy for the script engine.
//!
//! Every variant is recoverable at line granularity: the interpreter reports
//! it, sets `last` to 1 and moves on to the next line (or, inside a function
//! body, abandons the rest of the body).  Explicit exit is not an error at
//! all; it travels as
//! [`ControlFlow::Exit`](crate::script::interp::ControlFlow) so that no error
//! handler can swallow it.

use thiserror::Error;

/// Result type for engine operations.
pub type ShellResult<T = ()> = Result<T, ShellError>;

/// Errors raised while parsing or executing script lines.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Malformed or unbalanced block, malformed conditional, bad count.
    #[error("parse error: {0}")]
    Parse(String),

    /// `goto` target not defined in any reachable scope.
    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),

    /// Name not in the registry and the external fallback could not run it.
    #[error("unknown glyph: {name} (try 'help'){}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    CommandNotFound { name: String, detail: Option<String> },

    /// Error surfaced by a command's own execution.
    #[error("{command}: {message}")]
    Handler { command: String, message: String },

    /// Write to, or removal of, a readonly variable.
    #[error("cannot modify readonly variable: {0}")]
    ReadOnly(String),

    /// Frame stack exceeded the configured maximum depth.
    #[error("maximum nesting depth ({0}) exceeded")]
    Depth(usize),

    /// Filesystem or process I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Build a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        ShellError::Parse(msg.into())
    }

    /// Build a handler error attributed to `command`.
    pub fn handler(command: impl Into<String>, message: impl Into<String>) -> Self {
        ShellError::Handler {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Build a command-not-found error with no further detail.
    pub fn not_found(name: impl Into<String>) -> Self {
        ShellError::CommandNotFound {
            name: name.into(),
            detail: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
