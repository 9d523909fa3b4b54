//! Profile commands: prof, rrc, svrc

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::config::DEFAULT_PROFILE;
use crate::error::{ShellError, ShellResult};
use crate::script::interp::ScriptAction;

/// Register profile commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(ProfCommand);
    registry.register(RrcCommand);
    registry.register(SvrcCommand);
}

fn rc_file_name(ctx: &CommandContext<'_>) -> String {
    let path = ctx.session.profiles.path(&ctx.session.profile);
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── prof ──────────────────────────────────────────────────────────────────────

struct ProfCommand;

impl Command for ProfCommand {
    fn name(&self) -> &str {
        "prof"
    }

    fn help(&self) -> &str {
        "prof [show|new <name>|del <name>|<name>]\n  \
         List profiles, show the active one, create, delete, or switch to one"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let profiles = &ctx.session.profiles;
        match args {
            [] => Ok(CommandOutput::text(profiles.list().join("\n"))),
            [show] if show == "show" => Ok(CommandOutput::text(format!("current profile: {}", ctx.session.profile))),
            [new, name] if new == "new" => {
                if profiles.exists(name) {
                    return Ok(CommandOutput::fail("profile already exists"));
                }
                profiles.create(name)?;
                Ok(CommandOutput::text(format!("created profile: {name}")))
            }
            [del, name] if del == "del" => {
                if name == DEFAULT_PROFILE {
                    return Ok(CommandOutput::fail("cannot delete default profile"));
                }
                if !profiles.exists(name) {
                    return Ok(CommandOutput::fail("profile not found"));
                }
                profiles.delete(name)?;
                Ok(CommandOutput::text(format!("deleted profile: {name}")))
            }
            [name] => {
                if !profiles.exists(name) {
                    profiles.create(name)?;
                }
                ctx.push_action(ScriptAction::SwitchProfile(name.clone()));
                Ok(CommandOutput::text(format!("profile switched to: {name}")))
            }
            _ => Err(ShellError::handler(self.name(), "usage: prof [show|new <name>|del <name>|<name>]")),
        }
    }
}

// ── rrc / svrc ────────────────────────────────────────────────────────────────

struct RrcCommand;

impl Command for RrcCommand {
    fn name(&self) -> &str {
        "rrc"
    }

    fn help(&self) -> &str {
        "rrc\n  Reload the active profile"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        ctx.push_action(ScriptAction::ReloadProfile);
        Ok(CommandOutput::text(format!("{} reloaded", rc_file_name(ctx))))
    }
}

struct SvrcCommand;

impl Command for SvrcCommand {
    fn name(&self) -> &str {
        "svrc"
    }

    fn help(&self) -> &str {
        "svrc\n  Save the active profile"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        ctx.session.save_profile()?;
        Ok(CommandOutput::text(format!("config saved ({})", rc_file_name(ctx))))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
