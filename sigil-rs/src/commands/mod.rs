//! Built-in command implementations, organized by category.

pub mod control;
pub mod defs;
pub mod fs;
pub mod math;
pub mod profiles;
pub mod shell;
pub mod vars;

use crate::command::CommandRegistry;
use crate::error::ShellError;

/// Register all built-in commands with the registry.
pub fn register_all(registry: &mut CommandRegistry) {
    vars::register(registry);
    defs::register(registry);
    fs::register(registry);
    control::register(registry);
    math::register(registry);
    profiles::register(registry);
    shell::register(registry);
}

/// Usage error built from the first line of a command's help text.
pub(crate) fn usage(command: &str, help: &str) -> ShellError {
    let line = help.trim_start().lines().next().unwrap_or(command);
    ShellError::handler(command, format!("usage: {line}"))
}
