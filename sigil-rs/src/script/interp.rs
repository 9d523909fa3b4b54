//! Script interpreter.
//!
//! Execution is driven by an explicit stack of [`Frame`]s rather than host
//! recursion.  Each frame is a cursor over a line range of a shared
//! [`ScriptBuffer`]:
//!
//! | Frame kind | Pushed by                                  | On exhaustion           |
//! |------------|--------------------------------------------|-------------------------|
//! | `Script`   | a file, rc profile, or `run`/`inc`         | restore script context  |
//! | `Function` | `call`                                     | restore script context  |
//! | `Loop`     | `rpt` (inline or block)                    | rewind until count done |
//! | `Case`     | `case`, over the chosen clause body        | pop                     |
//! | `Inline`   | `if … then cmd`, alias expanding to keyword | pop                     |
//!
//! A command never calls back into the interpreter; it queues a
//! [`ScriptAction`] that is applied once it returns.  `break` and `exit`
//! travel as [`ControlFlow`] values, errors as [`ShellError`].

use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::command::{CommandContext, CommandRegistry};
use crate::console::Console;
use crate::error::{ShellError, ShellResult};
use crate::process;
use crate::script::cond;
use crate::script::expand::{interpolate, Expander};
use crate::script::lexer::{is_double_quoted, is_single_quoted, unquote};
use crate::script::stmt::{Keyword, Line, ScriptBuffer};
use crate::session::{ScriptInfo, Session};
use crate::var::VarLookup;

/// Status recorded when execution is interrupted.
pub const INTERRUPT_STATUS: i32 = 130;

// ── ControlFlow ───────────────────────────────────────────────────────────────

/// Non-error signals that unwind frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// Leave the innermost loop, case, function or script.
    Break,
    /// Stop everything with this status.
    Exit(i32),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to the end; carries the final `last` status.
    Completed(i32),
    /// `exit`/`quit` was executed.
    Exit(i32),
    /// Interrupted outside any loop.
    Interrupted,
}

impl Outcome {
    pub fn status(self) -> i32 {
        match self {
            Outcome::Completed(n) | Outcome::Exit(n) => n,
            Outcome::Interrupted => INTERRUPT_STATUS,
        }
    }
}

/// Requests a command makes of the interpreter.
#[derive(Debug)]
pub enum ScriptAction {
    Exit(i32),
    /// Execute a buffer.  `Some` installs a new script context (`run`);
    /// `None` shares the caller's (`inc`).
    RunScript { buffer: ScriptBuffer, script: Option<ScriptInfo> },
    /// Execute a function body with positional arguments.
    Call { name: String, body: ScriptBuffer, args: Vec<String> },
    /// Clear definitions and load another profile.
    SwitchProfile(String),
    /// Replay the active profile over the current definitions.
    ReloadProfile,
}

// ── Frames ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum FrameKind {
    Script {
        restore: Option<ScriptInfo>,
        loading: Option<bool>,
    },
    Function {
        name: String,
        restore: ScriptInfo,
    },
    Loop {
        /// Iterations left after the current one; `None` repeats forever.
        remaining: Option<u64>,
    },
    Case,
    Inline,
}

impl FrameKind {
    /// Scripts and functions bound label lookup and error recovery.
    fn is_boundary(&self) -> bool {
        matches!(self, FrameKind::Script { .. } | FrameKind::Function { .. })
    }
}

#[derive(Debug)]
struct Frame {
    buffer: Rc<ScriptBuffer>,
    start: usize,
    end: usize,
    cursor: usize,
    /// Label scope of the lines this frame runs.
    scope: Option<usize>,
    kind: FrameKind,
}

impl Frame {
    fn new(buffer: Rc<ScriptBuffer>, start: usize, end: usize, scope: Option<usize>, kind: FrameKind) -> Self {
        Self { buffer, start, end, cursor: start, scope, kind }
    }

    fn whole(buffer: Rc<ScriptBuffer>, kind: FrameKind) -> Self {
        let end = buffer.len();
        Self::new(buffer, 0, end, None, kind)
    }

    /// Rewind a loop for its next pass.  `false` when the frame is done.
    fn next_iteration(&mut self) -> bool {
        match &mut self.kind {
            FrameKind::Loop { remaining: None } => {}
            FrameKind::Loop { remaining: Some(0) } => return false,
            FrameKind::Loop { remaining: Some(n) } => *n -= 1,
            _ => return false,
        }
        self.cursor = self.start;
        true
    }
}

/// Parse an `rpt` count: a non-negative integer or `inf`/`infinite`/`forever`.
fn parse_count(text: &str) -> ShellResult<Option<u64>> {
    let lower = text.to_ascii_lowercase();
    if matches!(lower.as_str(), "inf" | "infinite" | "forever") {
        return Ok(None);
    }
    text.parse::<u64>()
        .map(Some)
        .map_err(|_| ShellError::parse(format!("rpt: invalid count '{text}'")))
}

fn log_stray_closers(buffer: &ScriptBuffer) {
    for (number, kw) in buffer.stray_closers() {
        debug!("line {number}: stray '{}'", kw.as_str());
    }
}

fn inline_buffer(tokens: &[String]) -> ShellResult<Rc<ScriptBuffer>> {
    Ok(Rc::new(ScriptBuffer::from_lines([tokens.join(" ")])?))
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// Executes script buffers against a [`Session`].
pub struct Interpreter {
    session: Session,
    console: Console,
    registry: Arc<CommandRegistry>,
    interrupt: Arc<AtomicBool>,
    frames: Vec<Frame>,
}

impl Interpreter {
    /// Interpreter with every built-in command registered.
    pub fn new(session: Session, console: Console) -> Self {
        Self::with_registry(session, console, Arc::new(CommandRegistry::with_builtins()))
    }

    pub fn with_registry(session: Session, console: Console, registry: Arc<CommandRegistry>) -> Self {
        Self {
            session,
            console,
            registry,
            interrupt: Arc::new(AtomicBool::new(false)),
            frames: Vec::new(),
        }
    }

    /// Flag that, once set, interrupts the innermost loop (or the whole run).
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Run script text in the current script context.
    ///
    /// A buffer that fails to parse runs nothing; the error is reported and
    /// `last` is set to 1.
    pub fn run_script(&mut self, text: &str) -> Outcome {
        self.interrupt.store(false, Ordering::SeqCst);
        let buffer = match ScriptBuffer::parse(text) {
            Ok(b) => b,
            Err(e) => return self.fail_outright(e),
        };
        log_stray_closers(&buffer);
        self.start(buffer, None, false)
    }

    /// Run one interactive line.
    pub fn run_line(&mut self, line: &str) -> Outcome {
        self.run_script(line)
    }

    /// Run the script file at `path` with positional `args`.
    pub fn run_file(&mut self, path: &Path, args: Vec<String>) -> ShellResult<Outcome> {
        self.interrupt.store(false, Ordering::SeqCst);
        let text = std::fs::read_to_string(path)?;
        let buffer = ScriptBuffer::parse(&text)?;
        let file = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        info!("running {}", file.display());
        log_stray_closers(&buffer);
        Ok(self.start(buffer, Some(ScriptInfo::new(Some(file), args)), false))
    }

    /// Replay the active profile's rc script, if it exists.
    pub fn load_profile(&mut self) -> Outcome {
        let text = match self.session.profiles.read(&self.session.profile) {
            Ok(Some(text)) => text,
            Ok(None) => return Outcome::Completed(0),
            Err(e) => return self.fail_outright(e.into()),
        };
        debug!("loading profile '{}'", self.session.profile);
        match ScriptBuffer::parse(&text) {
            Ok(buffer) => self.start(buffer, None, true),
            Err(e) => self.fail_outright(e),
        }
    }

    fn start(&mut self, buffer: ScriptBuffer, script: Option<ScriptInfo>, loading: bool) -> Outcome {
        let base = self.frames.len();
        if let Err(e) = self.push_script(buffer, script, loading) {
            return self.fail_outright(e);
        }
        self.drive(base)
    }

    fn fail_outright(&mut self, e: ShellError) -> Outcome {
        self.console.report(&e.to_string());
        self.session.set_last(1);
        Outcome::Completed(1)
    }

    // ── Frame stack ───────────────────────────────────────────────────────────

    fn check_depth(&self) -> ShellResult {
        if self.frames.len() >= self.session.settings.max_frames {
            return Err(ShellError::Depth(self.session.settings.max_frames));
        }
        Ok(())
    }

    fn push_frame(&mut self, frame: Frame) -> ShellResult {
        self.check_depth()?;
        self.frames.push(frame);
        Ok(())
    }

    fn push_script(&mut self, buffer: ScriptBuffer, script: Option<ScriptInfo>, loading: bool) -> ShellResult {
        self.check_depth()?;
        let restore = script.map(|info| self.session.set_script(info));
        let loading = loading.then(|| std::mem::replace(&mut self.session.loading, true));
        self.frames.push(Frame::whole(Rc::new(buffer), FrameKind::Script { restore, loading }));
        Ok(())
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        match frame.kind {
            FrameKind::Script { restore, loading } => {
                if let Some(info) = restore {
                    self.session.set_script(info);
                }
                if let Some(prev) = loading {
                    self.session.loading = prev;
                }
            }
            FrameKind::Function { name, restore } => {
                debug!("return from {name}");
                self.session.set_script(restore);
            }
            _ => {}
        }
    }

    fn unwind_to(&mut self, depth: usize) {
        while self.frames.len() > depth {
            self.pop_frame();
        }
    }

    /// Point the executing frame's cursor at `index`.
    fn set_cursor(&mut self, index: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.cursor = index;
        }
    }

    fn top_end(&self) -> usize {
        self.frames.last().map_or(0, |f| f.end)
    }

    // ── Main loop ─────────────────────────────────────────────────────────────

    fn drive(&mut self, base: usize) -> Outcome {
        while self.frames.len() > base {
            if self.interrupt.swap(false, Ordering::SeqCst) {
                if let Some(outcome) = self.handle_interrupt(base) {
                    return outcome;
                }
                continue;
            }
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            if frame.cursor >= frame.end {
                if !frame.next_iteration() {
                    self.pop_frame();
                }
                continue;
            }
            let index = frame.cursor;
            frame.cursor += 1;
            let buffer = Rc::clone(&frame.buffer);
            let Some(line) = buffer.line(index) else {
                continue;
            };
            match self.exec_line(&buffer, index, line) {
                Ok(None) => {}
                Ok(Some(ControlFlow::Break)) => self.unwind_break(base),
                Ok(Some(ControlFlow::Exit(code))) => {
                    self.unwind_to(base);
                    self.session.set_last(code);
                    return Outcome::Exit(code);
                }
                Err(e) => self.recover(e, base),
            }
        }
        Outcome::Completed(self.session.vars.status())
    }

    /// Pop up to and including the innermost loop, case, function or script.
    fn unwind_break(&mut self, base: usize) {
        while self.frames.len() > base {
            let inline = matches!(self.frames.last().map(|f| &f.kind), Some(FrameKind::Inline));
            self.pop_frame();
            if !inline {
                break;
            }
        }
    }

    /// Report a line error; inside a function, abandon the rest of the body.
    fn recover(&mut self, e: ShellError, base: usize) {
        self.console.report(&e.to_string());
        self.session.set_last(1);
        let boundary = self.frames[base..].iter().rposition(|f| f.kind.is_boundary());
        let Some(depth) = boundary.map(|pos| base + pos) else {
            return;
        };
        if let FrameKind::Function { name, .. } = &self.frames[depth].kind {
            warn!("function {name} aborted: {e}");
            self.unwind_to(depth);
        }
    }

    fn handle_interrupt(&mut self, base: usize) -> Option<Outcome> {
        self.console.report("interrupted");
        self.session.set_last(INTERRUPT_STATUS);
        let innermost_loop = self.frames[base..]
            .iter()
            .rposition(|f| matches!(f.kind, FrameKind::Loop { .. }));
        match innermost_loop {
            Some(pos) => {
                self.unwind_to(base + pos);
                None
            }
            None => {
                self.unwind_to(base);
                Some(Outcome::Interrupted)
            }
        }
    }

    // ── Line execution ────────────────────────────────────────────────────────

    fn expander(&self) -> Expander<'_> {
        Expander::new(&self.session.vars, &self.session.aliases).with_depth_limit(self.session.settings.alias_depth)
    }

    fn exec_line(&mut self, buffer: &Rc<ScriptBuffer>, index: usize, line: &Line) -> ShellResult<Option<ControlFlow>> {
        if line.is_empty() || line.label().is_some() {
            return Ok(None);
        }
        match line.keyword() {
            Some(kw) => self.exec_keyword(kw, buffer, index, &line.tokens),
            None => self.dispatch(&line.tokens),
        }
    }

    fn exec_keyword(
        &mut self,
        kw: Keyword,
        buffer: &Rc<ScriptBuffer>,
        index: usize,
        tokens: &[String],
    ) -> ShellResult<Option<ControlFlow>> {
        match kw {
            Keyword::Goto => {
                let [_, label] = tokens else {
                    return Err(ShellError::parse("usage: goto <label>"));
                };
                self.goto(label)?;
            }
            Keyword::Rpt => self.exec_rpt(buffer, index, tokens)?,
            Keyword::Case => self.exec_case(buffer, index, tokens)?,
            Keyword::If => self.exec_if(tokens)?,
            Keyword::Break => return Ok(Some(ControlFlow::Break)),
            Keyword::EndRpt | Keyword::EndCase | Keyword::When | Keyword::Else => {
                return Err(ShellError::parse(format!("unexpected '{}'", kw.as_str())));
            }
        }
        Ok(None)
    }

    /// Transfer control to `name`, searching outward to the nearest script or
    /// function boundary.
    fn goto(&mut self, name: &str) -> ShellResult {
        for i in (0..self.frames.len()).rev() {
            let frame = &self.frames[i];
            let target = match frame.kind {
                FrameKind::Inline => None,
                _ => frame.buffer.label(frame.scope, name),
            };
            let boundary = frame.kind.is_boundary();
            if let Some(target) = target {
                debug!("goto {name} -> frame {i} line {target}");
                self.unwind_to(i + 1);
                self.frames[i].cursor = target;
                return Ok(());
            }
            if boundary {
                break;
            }
        }
        Err(ShellError::UnresolvedLabel(name.to_owned()))
    }

    fn exec_rpt(&mut self, buffer: &Rc<ScriptBuffer>, index: usize, tokens: &[String]) -> ShellResult {
        let count = match tokens.get(1) {
            Some(tok) => parse_count(&self.expander().expand_arg(tok))?,
            None => None,
        };

        if tokens.len() >= 3 {
            if count == Some(0) {
                return Ok(());
            }
            let body = inline_buffer(&tokens[2..])?;
            let remaining = count.map(|n| n - 1);
            return self.push_frame(Frame::new(body, 0, 1, None, FrameKind::Loop { remaining }));
        }

        let end = match buffer.find_rpt_end(index) {
            Some(end) if end < self.top_end() => end,
            _ => {
                self.set_cursor(self.top_end());
                return Err(ShellError::parse("rpt block not closed (missing 'endrpt')"));
            }
        };
        self.set_cursor(end + 1);
        if count == Some(0) {
            return Ok(());
        }
        let remaining = count.map(|n| n - 1);
        self.push_frame(Frame::new(Rc::clone(buffer), index + 1, end, Some(index), FrameKind::Loop { remaining }))
    }

    fn exec_case(&mut self, buffer: &Rc<ScriptBuffer>, index: usize, tokens: &[String]) -> ShellResult {
        let [_, subject] = tokens else {
            return Err(ShellError::parse("usage: case <variable>"));
        };
        let end = match buffer.find_case_end(index) {
            Some(end) if end < self.top_end() => end,
            _ => {
                self.set_cursor(self.top_end());
                return Err(ShellError::parse("case block not closed (missing 'endcase')"));
            }
        };
        self.set_cursor(end + 1);

        let clauses = buffer.case_clauses(index, end);
        let chosen = {
            let ex = self.expander();
            let expands = |t: &str| t.contains('$') || is_double_quoted(t) || is_single_quoted(t);
            let value = if expands(subject) {
                ex.expand_arg(subject)
            } else {
                self.session.vars.lookup(subject).unwrap_or_default()
            };
            // Bare `when` values are literals; only quoted or `$` values expand.
            let matches = |v: &String| if expands(v) { ex.expand_arg(v) == value } else { *v == value };
            clauses
                .iter()
                .find(|c| c.values.as_ref().is_some_and(|vals| vals.iter().any(|v| matches(v))))
                .or_else(|| clauses.iter().find(|c| c.values.is_none()))
                .map(|c| (c.header, c.body.clone()))
        };
        if let Some((header, body)) = chosen {
            self.push_frame(Frame::new(Rc::clone(buffer), body.start, body.end, Some(header), FrameKind::Case))?;
        }
        Ok(())
    }

    fn exec_if(&mut self, tokens: &[String]) -> ShellResult {
        let rest = &tokens[1..];
        let Some(then) = rest.iter().position(|t| t == "then") else {
            return Err(ShellError::parse("if: missing 'then'"));
        };
        let (condition, command) = (&rest[..then], &rest[then + 1..]);
        if command.is_empty() {
            return Err(ShellError::parse("if: missing command after 'then'"));
        }
        if cond::evaluate(condition, &self.expander(), &self.session.cwd)? {
            let body = inline_buffer(command)?;
            self.push_frame(Frame::whole(body, FrameKind::Inline))?;
        } else {
            self.session.set_last(1);
        }
        Ok(())
    }

    // ── Command dispatch ──────────────────────────────────────────────────────

    fn dispatch(&mut self, tokens: &[String]) -> ShellResult<Option<ControlFlow>> {
        let tokens = self.expander().expand_aliases(tokens.to_vec());
        let Some(first) = tokens.first() else {
            return Ok(None);
        };
        if Keyword::from_token(first).is_some() {
            let body = inline_buffer(&tokens)?;
            self.push_frame(Frame::whole(body, FrameKind::Inline))?;
            return Ok(None);
        }

        let name = if first.contains('$') {
            interpolate(first, &self.session.vars)
        } else {
            first.clone()
        };
        let Some(cmd) = self.registry.get(&name) else {
            return self.run_external(&name, &tokens[1..]);
        };

        let args: Vec<String> = {
            let ex = self.expander();
            let (raw, keep) = (cmd.raw_args(), cmd.keep_quotes());
            tokens[1..]
                .iter()
                .enumerate()
                .map(|(i, t)| match (i < raw, keep) {
                    (true, true) => t.clone(),
                    (true, false) => unquote(t),
                    (false, true) => ex.expand_token(t),
                    (false, false) => ex.expand_arg(t),
                })
                .collect()
        };
        debug!("dispatch {name} {args:?}");

        let registry = Arc::clone(&self.registry);
        let mut actions = Vec::new();
        let output = {
            let mut ctx = CommandContext {
                session: &mut self.session,
                console: &mut self.console,
                registry: &registry,
                actions: &mut actions,
            };
            cmd.execute(&mut ctx, &args)?
        };
        if !output.text.is_empty() {
            self.console.emit(&output.text);
        }
        self.session.set_last(output.status);
        self.apply_actions(actions)
    }

    fn run_external(&mut self, name: &str, raw: &[String]) -> ShellResult<Option<ControlFlow>> {
        if !self.session.settings.external_fallback {
            return Err(ShellError::not_found(name));
        }
        let args: Vec<String> = {
            let ex = self.expander();
            raw.iter().map(|t| ex.expand_arg(t)).collect()
        };
        let status = process::run_external(name, &args, &self.session.cwd)?;
        self.session.set_last(status);
        Ok(None)
    }

    fn apply_actions(&mut self, actions: Vec<ScriptAction>) -> ShellResult<Option<ControlFlow>> {
        for action in actions {
            match action {
                ScriptAction::Exit(code) => return Ok(Some(ControlFlow::Exit(code))),
                ScriptAction::RunScript { buffer, script } => self.push_script(buffer, script, false)?,
                ScriptAction::Call { name, body, args } => {
                    self.check_depth()?;
                    debug!("call {name} {args:?}");
                    let file = self.session.script().file.clone();
                    let restore = self.session.set_script(ScriptInfo::new(file, args));
                    self.frames.push(Frame::whole(Rc::new(body), FrameKind::Function { name, restore }));
                }
                ScriptAction::SwitchProfile(name) => {
                    let text = self.session.profiles.read(&name)?;
                    let buffer = ScriptBuffer::parse(text.as_deref().unwrap_or_default())?;
                    self.session.clear_definitions();
                    info!("switching to profile '{name}'");
                    self.session.profile = name;
                    self.push_script(buffer, None, true)?;
                }
                ScriptAction::ReloadProfile => {
                    let text = self.session.profiles.read(&self.session.profile)?;
                    let buffer = ScriptBuffer::parse(text.as_deref().unwrap_or_default())?;
                    self.push_script(buffer, None, true)?;
                }
            }
        }
        Ok(None)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
