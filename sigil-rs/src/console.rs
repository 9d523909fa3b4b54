//! Output and input sink for the interpreter.
//!
//! Command output and error reports go through a [`Console`] rather than
//! straight to stdout, so that embedders and tests can capture them.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Where output goes and where prompts read from.
#[derive(Debug)]
pub enum Console {
    /// Real stdout/stderr/stdin.
    Terminal {
        /// Whether stdin is a terminal (prompts and notices are shown).
        interactive: bool,
    },
    /// In-memory buffers.
    Captured(Captured),
}

/// Buffers behind [`Console::Captured`].
#[derive(Debug, Default)]
pub struct Captured {
    pub lines: Vec<String>,
    pub errors: Vec<String>,
    /// Answers handed out to prompts, in order.
    pub input: VecDeque<String>,
}

impl Console {
    pub fn terminal(interactive: bool) -> Self {
        Console::Terminal { interactive }
    }

    pub fn captured() -> Self {
        Console::Captured(Captured::default())
    }

    /// Captured console with queued prompt answers.
    pub fn with_input<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Console::Captured(Captured {
            input: input.into_iter().map(Into::into).collect(),
            ..Captured::default()
        })
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Console::Terminal { interactive: true })
    }

    /// Write command output (one or more lines).
    pub fn emit(&mut self, text: &str) {
        match self {
            Console::Terminal { .. } => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{text}");
                let _ = out.flush();
            }
            Console::Captured(c) => c.lines.extend(text.lines().map(str::to_owned)),
        }
    }

    /// Write an error report.
    pub fn report(&mut self, msg: &str) {
        match self {
            Console::Terminal { .. } => eprintln!("{msg}"),
            Console::Captured(c) => c.errors.push(msg.to_owned()),
        }
    }

    /// Show `prompt` and read one line.  `Ok(None)` on end of input.
    pub fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self {
            Console::Terminal { .. } => {
                let mut out = io::stdout().lock();
                write!(out, "{prompt}")?;
                out.flush()?;
                drop(out);
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
            }
            Console::Captured(c) => Ok(c.input.pop_front()),
        }
    }

    /// Captured output lines (empty for a terminal console).
    pub fn lines(&self) -> &[String] {
        match self {
            Console::Captured(c) => &c.lines,
            Console::Terminal { .. } => &[],
        }
    }

    /// Captured error reports (empty for a terminal console).
    pub fn errors(&self) -> &[String] {
        match self {
            Console::Captured(c) => &c.errors,
            Console::Terminal { .. } => &[],
        }
    }

    /// Drain captured output.
    pub fn take_lines(&mut self) -> Vec<String> {
        match self {
            Console::Captured(c) => std::mem::take(&mut c.lines),
            Console::Terminal { .. } => Vec::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
