//! Shell bridge: sh

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::error::ShellResult;
use crate::process;

/// Register the shell bridge
pub fn register(registry: &mut CommandRegistry) {
    registry.register(ShCommand);
}

struct ShCommand;

impl Command for ShCommand {
    fn name(&self) -> &str {
        "sh"
    }

    fn help(&self) -> &str {
        "sh [command]\n  Run a command through the user's shell (or open an interactive shell)"
    }

    fn keep_quotes(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        if args.is_empty() {
            let status = process::interactive_shell(&ctx.session.cwd)?;
            return Ok(CommandOutput::status(status));
        }
        let out = process::run_shell(&args.join(" "), &ctx.session.cwd)?;
        let stderr = out.stderr.trim_end();
        if !stderr.is_empty() {
            ctx.console.report(stderr);
        }
        Ok(CommandOutput {
            text: out.stdout.trim_end().to_owned(),
            status: out.status,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use crate::commands::test_support::shell;

    #[test]
    fn captures_output_and_status() {
        let (_dir, mut it) = shell();
        it.run_script("let who = world\nsh echo \"hello $who\"; exit 3");
        assert_eq!(it.console().lines(), ["hello world"]);
        assert_eq!(it.session().vars.status(), 3);
    }
}
