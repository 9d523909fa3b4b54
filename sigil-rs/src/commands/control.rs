//! Script control commands: exit, wait, run, inc, schk, help

use std::fs;
use std::time::Duration;

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::commands::usage;
use crate::error::{ShellError, ShellResult};
use crate::script::interp::ScriptAction;
use crate::script::lexer::{count_quotes, strip_comments, tokenize};
use crate::script::stmt::{label_name, Keyword, ScriptBuffer, KEYWORDS};
use crate::session::ScriptInfo;

/// Register control commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(ExitCommand);
    registry.register(WaitCommand);
    registry.register(RunCommand);
    registry.register(IncCommand);
    registry.register(SchkCommand);
    registry.register(HelpCommand);
}

/// Read a script file relative to the working directory.
fn read_script(ctx: &CommandContext<'_>, command: &str, target: &str) -> ShellResult<(std::path::PathBuf, String)> {
    let path = ctx.session.resolve(target);
    match fs::read_to_string(&path) {
        Ok(text) => Ok((path, text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ShellError::handler(command, format!("file not found: {}", path.display())))
        }
        Err(e) => Err(e.into()),
    }
}

// ── exit ──────────────────────────────────────────────────────────────────────

struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &str {
        "exit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit"]
    }

    fn help(&self) -> &str {
        "exit [code]\n  Exit Sigil with an optional exit code (a non-numeric code exits with 1)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let code = match args.first() {
            Some(arg) => arg.parse::<i32>().unwrap_or(1),
            None => 0,
        };
        ctx.push_action(ScriptAction::Exit(code));
        Ok(CommandOutput::status(code))
    }
}

// ── wait ──────────────────────────────────────────────────────────────────────

struct WaitCommand;

impl Command for WaitCommand {
    fn name(&self) -> &str {
        "wait"
    }

    fn aliases(&self) -> &[&str] {
        &["sleep"]
    }

    fn help(&self) -> &str {
        "wait <seconds>\n  Sleep for the given number of seconds (fractions allowed)"
    }

    fn execute(&self, _ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(arg) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let secs: f64 = arg
            .parse()
            .ok()
            .filter(|s: &f64| s.is_finite() && *s >= 0.0)
            .ok_or_else(|| ShellError::handler(self.name(), format!("invalid number: {arg}")))?;
        std::thread::sleep(Duration::from_secs_f64(secs));
        Ok(CommandOutput::ok())
    }
}

// ── run / inc ─────────────────────────────────────────────────────────────────

struct RunCommand;

impl Command for RunCommand {
    fn name(&self) -> &str {
        "run"
    }

    fn help(&self) -> &str {
        "run <file.sig> [args…]\n  Run another script with its own arguments"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [target, script_args @ ..] = args else {
            return Err(usage(self.name(), self.help()));
        };
        let (path, text) = read_script(ctx, self.name(), target)?;
        let buffer = ScriptBuffer::parse(&text)?;
        let script = ScriptInfo::new(Some(fs::canonicalize(&path).unwrap_or(path)), script_args.to_vec());
        ctx.push_action(ScriptAction::RunScript { buffer, script: Some(script) });
        Ok(CommandOutput::ok())
    }
}

struct IncCommand;

impl Command for IncCommand {
    fn name(&self) -> &str {
        "inc"
    }

    fn aliases(&self) -> &[&str] {
        &["include"]
    }

    fn help(&self) -> &str {
        "inc <file.sig>\n  Include a file inline, sharing the current script context"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let (_, text) = read_script(ctx, self.name(), target)?;
        let buffer = ScriptBuffer::parse(&text)?;
        ctx.push_action(ScriptAction::RunScript { buffer, script: None });
        Ok(CommandOutput::ok())
    }
}

// ── schk ──────────────────────────────────────────────────────────────────────

struct SchkCommand;

impl SchkCommand {
    /// Problems found in `text`, as `(line number, message)`.
    fn check(ctx: &CommandContext<'_>, text: &str) -> Vec<(usize, String)> {
        let mut problems = Vec::new();
        let mut in_block = false;
        for (i, raw) in text.lines().enumerate() {
            let (visible, still_open) = strip_comments(raw, in_block);
            in_block = still_open;
            if count_quotes(&visible) % 2 != 0 {
                problems.push((i + 1, "unmatched quote".to_owned()));
            }
            let tokens = tokenize(&visible);
            let Some(first) = tokens.first() else { continue };
            let known = Keyword::from_token(first).is_some()
                || label_name(&visible).is_some()
                || first.contains('$')
                || ctx.registry.contains(first)
                || ctx.session.aliases.contains(first);
            if !known {
                problems.push((i + 1, format!("unknown glyph: {first}")));
            }
        }
        match ScriptBuffer::parse(text) {
            Ok(buffer) => {
                for (number, kw) in buffer.stray_closers() {
                    problems.push((number, format!("unexpected '{}'", kw.as_str())));
                }
                let open = buffer.open_blocks();
                if open > 0 {
                    problems.push((buffer.len(), format!("{open} unclosed block(s)")));
                }
            }
            // Duplicate labels carry their own line number.
            Err(e) => problems.push((0, e.to_string())),
        }
        problems.sort_by_key(|(n, _)| *n);
        problems
    }
}

impl Command for SchkCommand {
    fn name(&self) -> &str {
        "schk"
    }

    fn help(&self) -> &str {
        "schk <file.sig>\n  Syntax check: quotes, unknown glyphs, unbalanced blocks, duplicate labels"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let (_, text) = read_script(ctx, self.name(), target)?;
        let problems = Self::check(ctx, &text);
        if problems.is_empty() {
            return Ok(CommandOutput::text("No syntax problems found."));
        }
        let mut out = vec!["Syntax check found problems:".to_owned()];
        for (number, msg) in problems {
            if number == 0 {
                out.push(format!("  {msg}"));
            } else {
                out.push(format!("  Line {number}: {msg}"));
            }
        }
        Ok(CommandOutput::fail(out.join("\n")))
    }
}

// ── help ──────────────────────────────────────────────────────────────────────

struct HelpCommand;

fn keyword_help(kw: Keyword) -> &'static str {
    match kw {
        Keyword::Goto => "goto <label>\n  Jump to a line labelled `label:`",
        Keyword::Rpt | Keyword::EndRpt => {
            "rpt <count|inf> <command…>  or  rpt <count|inf> … endrpt\n  \
             Repeat a command or block a number of times, or forever"
        }
        Keyword::Case | Keyword::When | Keyword::Else | Keyword::EndCase => {
            "case <var> / when <value…> / else / endcase\n  Run the first clause whose value matches"
        }
        Keyword::If => {
            "if <cond> then <cmd>\n  Conditional execution.  cond examples: exists <path>, 5 > 3, name == \"bob\""
        }
        Keyword::Break => "break\n  Leave the innermost loop, case, function or script",
    }
}

impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn help(&self) -> &str {
        "help [glyph]\n  Show all glyphs or help for one\n\n\
         Comments: & single-line, # single-line, // single-line, /* … */ block comments"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(topic) = args.first() else {
            let mut out = vec!["Available glyphs:".to_owned(), String::new()];
            out.extend(ctx.registry.names().into_iter().map(|n| format!("  {n}")));
            out.push(String::new());
            let keywords: Vec<&str> = KEYWORDS.iter().map(|k| k.as_str()).collect();
            out.push(format!("Keywords: {}", keywords.join(" ")));
            out.push(String::new());
            out.push("Type: help <glyph> for details".to_owned());
            return Ok(CommandOutput::text(out.join("\n")));
        };
        if let Some(cmd) = ctx.registry.get(topic) {
            return Ok(CommandOutput::text(cmd.help().trim()));
        }
        match Keyword::from_token(topic) {
            Some(kw) => Ok(CommandOutput::text(keyword_help(kw))),
            None => Ok(CommandOutput::fail("No help available")),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::commands::test_support::{output, shell};
    use crate::script::Outcome;

    #[test]
    fn exit_codes() {
        let (_dir, mut it) = shell();
        assert_eq!(it.run_script("exit 4\nsay no"), Outcome::Exit(4));
        assert_eq!(it.run_script("quit oops"), Outcome::Exit(1));
        assert_eq!(it.run_script("exit"), Outcome::Exit(0));
        assert!(it.console().lines().is_empty());
    }

    #[test]
    fn wait_rejects_bad_number() {
        let (_dir, mut it) = shell();
        it.run_script("wait 0\nsleep soon");
        assert_eq!(it.console().errors(), ["wait: invalid number: soon"]);
    }

    #[test]
    fn run_gets_own_arguments_and_restores() {
        let (dir, mut it) = shell();
        fs::write(dir.path().join("child.sig"), "arg 1\narg count").unwrap();
        it.run_script("run child.sig x y\narg count");
        assert_eq!(it.console().lines(), ["x", "2", "0"]);
    }

    #[test]
    fn run_sets_script_dir() {
        let (dir, mut it) = shell();
        fs::write(dir.path().join("where.sig"), "say ${script.dir}").unwrap();
        it.run_script("run where.sig");
        let expected = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(it.console().lines(), [expected.display().to_string()]);
    }

    #[test]
    fn inc_shares_definitions() {
        let (dir, mut it) = shell();
        fs::write(dir.path().join("lib.sig"), "let shared = 7").unwrap();
        it.run_script("inc lib.sig\nsay $shared");
        assert_eq!(it.console().lines(), ["7"]);
    }

    #[test]
    fn run_missing_file() {
        let (_dir, mut it) = shell();
        it.run_script("run nope.sig");
        assert!(it.console().errors()[0].starts_with("run: file not found"));
    }

    #[test]
    fn schk_reports_problems() {
        let (dir, mut it) = shell();
        fs::write(
            dir.path().join("bad.sig"),
            "say \"open\nfrobnicate\nrpt 2\nsay x\nendcase\nstart:\nsay ok",
        )
        .unwrap();
        it.run_script("schk bad.sig");
        let lines = it.console().lines();
        assert_eq!(lines[0], "Syntax check found problems:");
        assert!(lines.contains(&"  Line 1: unmatched quote".to_owned()));
        assert!(lines.contains(&"  Line 2: unknown glyph: frobnicate".to_owned()));
        assert!(lines.contains(&"  Line 5: unexpected 'endcase'".to_owned()));
        assert!(lines.iter().any(|l| l.contains("1 unclosed block(s)")));
        assert_eq!(it.session().vars.status(), 1);
    }

    #[test]
    fn schk_clean_file() {
        let (dir, mut it) = shell();
        fs::write(dir.path().join("ok.sig"), "top:\nrpt 2\nsay hi\nendrpt\n# done").unwrap();
        it.run_script("schk ok.sig");
        assert_eq!(it.console().lines(), ["No syntax problems found."]);
    }

    #[test]
    fn help_lists_and_describes() {
        let lines = output("help");
        assert_eq!(lines[0], "Available glyphs:");
        assert!(lines.contains(&"  say".to_owned()));
        assert!(lines.iter().any(|l| l.starts_with("Keywords: goto rpt")));

        assert_eq!(output("help quit")[0], "exit [code]");
        assert_eq!(output("help when")[0], "case <var> / when <value…> / else / endcase");
        assert_eq!(output("help nothing"), vec!["No help available"]);
    }
}
