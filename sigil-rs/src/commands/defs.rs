//! Definition commands: alia, unalia, fn, unfn, call

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::commands::usage;
use crate::error::{ShellError, ShellResult};
use crate::macros::{join_body, split_body};
use crate::script::interp::ScriptAction;
use crate::script::lexer::tokenize;
use crate::script::stmt::ScriptBuffer;

/// Register definition commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(AliaCommand);
    registry.register(UnaliaCommand);
    registry.register(FnCommand);
    registry.register(UnfnCommand);
    registry.register(CallCommand);
}

// ── alia ──────────────────────────────────────────────────────────────────────

struct AliaCommand;

impl Command for AliaCommand {
    fn name(&self) -> &str {
        "alia"
    }

    fn help(&self) -> &str {
        "alia <name> <command>  or  alia  (list aliases)"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn keep_quotes(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        match args {
            [] => {
                let aliases = ctx.session.aliases.sorted();
                if aliases.is_empty() {
                    return Ok(CommandOutput::fail("no aliases defined"));
                }
                let lines: Vec<String> = aliases.into_iter().map(|(k, v)| format!("{k} -> {v}")).collect();
                Ok(CommandOutput::text(lines.join("\n")))
            }
            [_] => Err(usage(self.name(), self.help())),
            [name, body @ ..] => {
                let text = body.join(" ");
                ctx.notice(&format!("Alias set: {name} -> {text}"));
                ctx.session.aliases.define(name.as_str(), text);
                ctx.session.autosave();
                Ok(CommandOutput::ok())
            }
        }
    }
}

// ── unalia ────────────────────────────────────────────────────────────────────

struct UnaliaCommand;

impl Command for UnaliaCommand {
    fn name(&self) -> &str {
        "unalia"
    }

    fn help(&self) -> &str {
        "unalia <name>\n  Remove an alias"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [name] = args else {
            return Err(usage(self.name(), self.help()));
        };
        if !ctx.session.aliases.remove(name) {
            return Ok(CommandOutput::fail(format!("alias not found: {name}")));
        }
        ctx.session.autosave();
        ctx.notice(&format!("Alias removed: {name}"));
        Ok(CommandOutput::ok())
    }
}

// ── fn ────────────────────────────────────────────────────────────────────────

struct FnCommand;

impl Command for FnCommand {
    fn name(&self) -> &str {
        "fn"
    }

    fn help(&self) -> &str {
        "fn <name> <command> [;; <command>…]  or  fn  (list functions)\n  \
         Define a function; run it with: call <name> [args…]"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn keep_quotes(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [name, rest @ ..] = args else {
            let functions = ctx.session.functions.sorted();
            if functions.is_empty() {
                return Ok(CommandOutput::fail("no functions defined"));
            }
            let lines: Vec<String> = functions
                .into_iter()
                .map(|(k, body)| format!("{k}: {}", join_body(body)))
                .collect();
            return Ok(CommandOutput::text(lines.join("\n")));
        };
        let body = split_body(rest);
        if body.is_empty() {
            return Err(usage(self.name(), self.help()));
        }
        if body.iter().any(|cmd| tokenize(cmd).first().is_some_and(|t| t == self.name())) {
            return Err(ShellError::handler(self.name(), "function bodies cannot define functions"));
        }
        ctx.notice(&format!("Function defined: {name} ({} commands)", body.len()));
        ctx.session.functions.define(name.as_str(), body);
        ctx.session.autosave();
        Ok(CommandOutput::ok())
    }
}

// ── unfn ──────────────────────────────────────────────────────────────────────

struct UnfnCommand;

impl Command for UnfnCommand {
    fn name(&self) -> &str {
        "unfn"
    }

    fn help(&self) -> &str {
        "unfn <name>\n  Remove a function"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [name] = args else {
            return Err(usage(self.name(), self.help()));
        };
        if !ctx.session.functions.remove(name) {
            return Ok(CommandOutput::fail(format!("function not found: {name}")));
        }
        ctx.session.autosave();
        ctx.notice(&format!("Function removed: {name}"));
        Ok(CommandOutput::ok())
    }
}

// ── call ──────────────────────────────────────────────────────────────────────

struct CallCommand;

impl Command for CallCommand {
    fn name(&self) -> &str {
        "call"
    }

    fn help(&self) -> &str {
        "call <name> [args…]\n  Run a function; its arguments are read with arg <n>"
    }

    fn raw_args(&self) -> usize {
        1
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [name, call_args @ ..] = args else {
            return Err(usage(self.name(), self.help()));
        };
        let Some(body) = ctx.session.functions.get(name) else {
            return Err(ShellError::handler(self.name(), format!("function not found: {name}")));
        };
        let body = ScriptBuffer::from_lines(body)?;
        ctx.push_action(ScriptAction::Call {
            name: name.clone(),
            body,
            args: call_args.to_vec(),
        });
        Ok(CommandOutput::ok())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::commands::test_support::{output, shell};

    #[test]
    fn alias_list_and_remove() {
        let (_dir, mut it) = shell();
        it.run_script("alia hi say hello\nalia\nhi there\nunalia hi\nunalia hi");
        assert_eq!(it.console().lines(), ["hi -> say hello", "hello there", "alias not found: hi"]);
    }

    #[test]
    fn alias_keeps_quotes_and_variables_unexpanded() {
        let (_dir, mut it) = shell();
        it.run_script("let who = a\nalia greet say \"hi $who\"\nlet who = b\ngreet");
        assert_eq!(it.session().aliases.get("greet"), Some("say \"hi $who\""));
        assert_eq!(it.console().lines(), ["hi b"]);
    }

    #[test]
    fn function_listing() {
        assert_eq!(
            output("fn two say a ;; say b\nfn"),
            vec!["two: say a ;; say b"]
        );
    }

    #[test]
    fn nested_definition_rejected() {
        let (_dir, mut it) = shell();
        it.run_script("fn outer fn inner say x");
        assert!(!it.session().functions.contains("outer"));
        assert_eq!(it.console().errors(), ["fn: function bodies cannot define functions"]);
    }

    #[test]
    fn call_missing_function() {
        let (_dir, mut it) = shell();
        it.run_script("call ghost");
        assert_eq!(it.console().errors(), ["call: function not found: ghost"]);
        assert_eq!(it.session().vars.status(), 1);
    }

    #[test]
    fn break_ends_function_body() {
        assert_eq!(output("fn f say a ;; break ;; say b\ncall f\nsay after"), vec!["a", "after"]);
    }

    #[test]
    fn unfn_removes() {
        let (_dir, mut it) = shell();
        it.run_script("fn f say a\nunfn f\ncall f");
        assert!(it.session().functions.is_empty());
        assert_eq!(it.console().errors().len(), 1);
    }
}
