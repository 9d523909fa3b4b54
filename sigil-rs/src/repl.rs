//! Interactive read-eval loop.
//!
//! Lines are collected until they form a complete unit (no open `rpt`/`case`
//! block, no open block comment) and then run as one buffer, so block
//! constructs can be typed across several lines.

use log::{debug, warn};

use crate::script::lexer::strip_comments;
use crate::script::{Interpreter, Outcome, ScriptBuffer};

pub const PROMPT: &str = "sigil> ";
pub const CONTINUATION_PROMPT: &str = "...> ";

/// Whether `text` still needs more lines before it can run.
pub fn is_incomplete(text: &str) -> bool {
    let mut in_block = false;
    for line in text.lines() {
        in_block = strip_comments(line, in_block).1;
    }
    if in_block {
        return true;
    }
    // A buffer that fails to parse is complete; running it reports the error.
    ScriptBuffer::parse(text).is_ok_and(|b| b.open_blocks() > 0)
}

/// Run the loop until end of input or `exit`; returns the process status.
pub fn run(interp: &mut Interpreter) -> i32 {
    let interactive = interp.console().is_interactive();
    if interactive {
        interp.console_mut().emit("Sigil REPL - type 'help' for glyphs, 'exit' to leave");
    }
    let mut pending = String::new();
    loop {
        let prompt = match (interactive, pending.is_empty()) {
            (false, _) => "",
            (true, true) => PROMPT,
            (true, false) => CONTINUATION_PROMPT,
        };
        let line = match interp.console_mut().prompt(prompt) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("reading input failed: {e}");
                return 1;
            }
        };
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(&line);
        if is_incomplete(&pending) {
            continue;
        }
        let text = std::mem::take(&mut pending);
        if text.trim().is_empty() {
            continue;
        }
        match interp.run_script(&text) {
            Outcome::Exit(code) => return code,
            Outcome::Interrupted => debug!("interrupted"),
            Outcome::Completed(_) => {}
        }
    }
    if !pending.trim().is_empty() {
        if let Outcome::Exit(code) = interp.run_script(&pending) {
            return code;
        }
    }
    interp.session().vars.status()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
