//! Output and variable commands: say, let, var, unset, export, ask, arg

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::commands::usage;
use crate::error::{ShellError, ShellResult};
use crate::profile::SESSION_VARS;
use crate::script::lexer::{is_double_quoted, is_single_quoted, unquote};
use crate::script::value::Value;

/// Register variable commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(SayCommand);
    registry.register(LetCommand);
    registry.register(VarCommand);
    registry.register(UnsetCommand);
    registry.register(ExportCommand);
    registry.register(AskCommand);
    registry.register(ArgCommand);
}

/// Read one answer from the console; end of input reads as empty.
fn read_answer(ctx: &mut CommandContext<'_>, prompt: &str) -> ShellResult<String> {
    let shown = if prompt.is_empty() { String::new() } else { format!("{prompt} ") };
    Ok(ctx.console.prompt(&shown)?.unwrap_or_default())
}

// ── say ───────────────────────────────────────────────────────────────────────

struct SayCommand;

impl Command for SayCommand {
    fn name(&self) -> &str {
        "say"
    }

    fn help(&self) -> &str {
        "say <text>\n  Print text to the console (variables are substituted)"
    }

    fn execute(&self, _ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        Ok(CommandOutput::text(args.join(" ")))
    }
}

// ── let ───────────────────────────────────────────────────────────────────────

struct LetCommand;

impl LetCommand {
    fn value(ctx: &mut CommandContext<'_>, rest: &[String]) -> ShellResult<Value> {
        match rest {
            [] => Ok(Value::default()),
            [first, prompt @ ..] if first == "ask" => {
                let prompt: Vec<String> = prompt.iter().map(|t| ctx.expand_arg(t)).collect();
                Ok(Value::Str(read_answer(ctx, &prompt.join(" "))?))
            }
            // A quoted literal is always a string.
            [single] if is_double_quoted(single) => Ok(Value::Str(ctx.expand_arg(single))),
            [single] if is_single_quoted(single) => Ok(Value::parse_literal(&ctx.expand_arg(single))),
            tokens => {
                let text: Vec<String> = tokens.iter().map(|t| ctx.expand_arg(t)).collect();
                Ok(Value::parse_literal(&text.join(" ")))
            }
        }
    }
}

impl Command for LetCommand {
    fn name(&self) -> &str {
        "let"
    }

    fn help(&self) -> &str {
        "let [-r] <name> = <value>\n  \
         Define a variable (string or number).  Use it as $name or ${name}.\n  \
         Also: let name (declare empty), let -r name = value (readonly),\n  \
         let name = ask \"Prompt\""
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn keep_quotes(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let (readonly, args) = match args {
            [flag, rest @ ..] if flag == "-r" => (true, rest),
            _ => (false, args),
        };
        let (name, rest) = match args {
            [] => return Err(usage(self.name(), self.help())),
            [name, eq, rest @ ..] if eq == "=" => (unquote(name), rest),
            [name, rest @ ..] => (unquote(name), rest),
        };
        let value = Self::value(ctx, rest)?;
        let shown = value.to_string();
        ctx.session.vars.set(&name, value, readonly)?;
        ctx.session.autosave();
        ctx.notice(&format!("Set {name} = {shown}"));
        Ok(CommandOutput::ok())
    }
}

// ── var ───────────────────────────────────────────────────────────────────────

struct VarCommand;

impl Command for VarCommand {
    fn name(&self) -> &str {
        "var"
    }

    fn help(&self) -> &str {
        "var\n  List variables"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        let vars = &ctx.session.vars;
        let lines: Vec<String> = vars
            .sorted()
            .into_iter()
            .filter(|(k, _)| !SESSION_VARS.contains(k))
            .map(|(k, v)| {
                let ro = if vars.is_readonly(k) { " (readonly)" } else { "" };
                let ex = if vars.is_exported(k) { " (exported)" } else { "" };
                format!("{k} = {v}{ro}{ex}")
            })
            .collect();
        if lines.is_empty() {
            return Ok(CommandOutput::fail("no variables defined"));
        }
        Ok(CommandOutput::text(lines.join("\n")))
    }
}

// ── unset ─────────────────────────────────────────────────────────────────────

struct UnsetCommand;

impl Command for UnsetCommand {
    fn name(&self) -> &str {
        "unset"
    }

    fn help(&self) -> &str {
        "unset <name> [name…]\n  Remove variables (readonly variables cannot be removed)"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        if args.is_empty() {
            return Err(usage(self.name(), self.help()));
        }
        let mut missing = Vec::new();
        for name in args {
            if ctx.session.vars.unset(name)? {
                ctx.notice(&format!("unset {name}"));
            } else {
                missing.push(format!("variable not found: {name}"));
            }
        }
        ctx.session.autosave();
        if missing.is_empty() {
            Ok(CommandOutput::ok())
        } else {
            Ok(CommandOutput::fail(missing.join("\n")))
        }
    }
}

// ── export ────────────────────────────────────────────────────────────────────

struct ExportCommand;

impl Command for ExportCommand {
    fn name(&self) -> &str {
        "export"
    }

    fn help(&self) -> &str {
        "export <name> [name…]\n  Copy variables into the environment of external commands"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        if args.is_empty() {
            return Err(usage(self.name(), self.help()));
        }
        let missing: Vec<String> = args
            .iter()
            .filter(|name| !ctx.session.vars.export(name))
            .map(|name| format!("variable not found: {name}"))
            .collect();
        ctx.session.autosave();
        if missing.is_empty() {
            Ok(CommandOutput::ok())
        } else {
            Ok(CommandOutput::fail(missing.join("\n")))
        }
    }
}

// ── ask ───────────────────────────────────────────────────────────────────────

struct AskCommand;

impl Command for AskCommand {
    fn name(&self) -> &str {
        "ask"
    }

    fn help(&self) -> &str {
        "ask <name> [prompt]\n  Prompt the user and store the answer in <name> (also: ask = name)"
    }

    fn raw_args(&self) -> usize {
        usize::MAX
    }

    fn keep_quotes(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let (name, prompt) = match args {
            [eq, name] if eq == "=" => (unquote(name), String::new()),
            [eq] if eq == "=" => return Err(usage(self.name(), self.help())),
            [name, prompt @ ..] => {
                let prompt: Vec<String> = prompt.iter().map(|t| ctx.expand_arg(t)).collect();
                (unquote(name), prompt.join(" "))
            }
            [] => return Err(usage(self.name(), self.help())),
        };
        let answer = read_answer(ctx, &prompt)?;
        ctx.session.vars.set(&name, Value::Str(answer), false)?;
        Ok(CommandOutput::ok())
    }
}

// ── arg ───────────────────────────────────────────────────────────────────────

struct ArgCommand;

impl Command for ArgCommand {
    fn name(&self) -> &str {
        "arg"
    }

    fn help(&self) -> &str {
        "arg <n> | arg count\n  Print script argument n (1-based), or the number of arguments"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(which) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let script_args = &ctx.session.script().args;
        if which.eq_ignore_ascii_case("count") {
            return Ok(CommandOutput::text(script_args.len().to_string()));
        }
        let index: usize = which
            .parse()
            .map_err(|_| ShellError::handler(self.name(), format!("invalid argument index: {which}")))?;
        match index.checked_sub(1).and_then(|i| script_args.get(i)) {
            Some(arg) => Ok(CommandOutput::text(arg.clone())),
            None => Ok(CommandOutput::status(1)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
