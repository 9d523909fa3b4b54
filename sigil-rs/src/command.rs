//! Command trait and registry.
//!
//! Every built-in command implements [`Command`] and is registered by name
//! (plus any aliases) in a [`CommandRegistry`].  The interpreter resolves
//! the first word of each expanded line against the registry and calls
//! [`Command::execute`] with a [`CommandContext`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::console::Console;
use crate::error::ShellResult;
use crate::script::expand::Expander;
use crate::script::interp::ScriptAction;
use crate::session::Session;

// ── CommandOutput ─────────────────────────────────────────────────────────────

/// Result of a successful command: text to print plus a status code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub status: i32,
}

impl CommandOutput {
    /// No output, status 0.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Output text with status 0.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), status: 0 }
    }

    /// Output text with status 1.
    pub fn fail(text: impl Into<String>) -> Self {
        Self { text: text.into(), status: 1 }
    }

    /// No output with an explicit status.
    pub fn status(status: i32) -> Self {
        Self { text: String::new(), status }
    }
}

// ── CommandContext ────────────────────────────────────────────────────────────

/// Everything a command may touch while it runs.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub console: &'a mut Console,
    pub registry: &'a CommandRegistry,
    /// Requests for the interpreter, applied after the command returns.
    pub actions: &'a mut Vec<ScriptAction>,
}

impl<'a> CommandContext<'a> {
    /// Queue an interpreter request.
    pub fn push_action(&mut self, action: ScriptAction) {
        self.actions.push(action);
    }

    /// Expand and unquote a raw token with the current session state.
    pub fn expand_arg(&self, token: &str) -> String {
        Expander::new(&self.session.vars, &self.session.aliases)
            .with_depth_limit(self.session.settings.alias_depth)
            .expand_arg(token)
    }

    /// Show a confirmation message on an interactive console only.
    pub fn notice(&mut self, msg: &str) {
        if self.console.is_interactive() {
            self.console.emit(msg);
        }
    }
}

// ── Command trait ─────────────────────────────────────────────────────────────

/// A built-in command.
pub trait Command: Send + Sync {
    /// Primary name.
    fn name(&self) -> &str;

    /// One-paragraph usage text shown by `help`.
    fn help(&self) -> &str;

    /// Alternative names.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Number of leading arguments passed through without expansion.
    fn raw_args(&self) -> usize {
        0
    }

    /// Keep double quotes on arguments instead of stripping them.
    fn keep_quotes(&self) -> bool {
        false
    }

    /// Run the command.
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput>;
}

// ── CommandRegistry ───────────────────────────────────────────────────────────

/// Registry mapping command names to implementations.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::commands::register_all(&mut registry);
        registry
    }

    /// Register a command and its aliases.
    pub fn register<C: Command + 'static>(&mut self, cmd: C) {
        let name = cmd.name().to_owned();
        for alias in cmd.aliases() {
            self.aliases.insert((*alias).to_owned(), name.clone());
        }
        self.commands.insert(name, Arc::new(cmd));
    }

    /// Look up a command by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        if let Some(cmd) = self.commands.get(name) {
            return Some(Arc::clone(cmd));
        }
        self.aliases
            .get(name)
            .and_then(|real| self.commands.get(real))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Primary names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Command for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn help(&self) -> &str {
            "echo <text>"
        }

        fn aliases(&self) -> &[&str] {
            &["print"]
        }

        fn execute(&self, _ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
            Ok(CommandOutput::text(args.join(" ")))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = CommandRegistry::new();
        registry.register(Echo);
        assert!(registry.contains("echo"));
        assert!(registry.contains("print"));
        assert_eq!(registry.get("print").map(|c| c.name().to_owned()).as_deref(), Some("echo"));
        assert!(registry.get("nope").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn builtins_cover_core_commands() {
        let registry = CommandRegistry::with_builtins();
        for name in ["say", "let", "alia", "fn", "call", "mk", "undo", "redo", "exit", "quit", "help"] {
            assert!(registry.contains(name), "missing builtin {name}");
        }
    }
}
