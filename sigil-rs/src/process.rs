//! External process invocation.
//!
//! Two entry points:
//!
//! - [`run_external`] is the fallback for names not in the registry. It
//!   spawns the program with inherited stdio and waits for it.
//! - [`run_shell`] backs the `sh` bridge. It runs a command string through
//!   the user's shell and captures its output.
//!
//! Both are synchronous spawn-and-wait; the interpreter never runs two
//! processes at once.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{ShellError, ShellResult};

/// Status reported when a process was killed by a signal.
const SIGNAL_STATUS: i32 = 128;

/// Captured result of [`run_shell`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

/// Run `name args…` in `cwd` with inherited stdio; return its exit status.
///
/// A spawn failure is reported as [`ShellError::CommandNotFound`]; a missing
/// program carries no detail, anything else carries the OS error text.
pub fn run_external(name: &str, args: &[String], cwd: &Path) -> ShellResult<i32> {
    debug!("external: {name} {args:?}");
    let status = Command::new(name)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| not_found(name, &e))?;
    Ok(status.code().unwrap_or(SIGNAL_STATUS))
}

fn not_found(name: &str, e: &io::Error) -> ShellError {
    let detail = match e.kind() {
        io::ErrorKind::NotFound => None,
        _ => Some(e.to_string()),
    };
    ShellError::CommandNotFound { name: name.to_owned(), detail }
}

/// The user's shell: `$SHELL`, else `sh` (or `cmd` on Windows).
pub fn user_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| if cfg!(windows) { "cmd".to_owned() } else { "sh".to_owned() })
}

fn shell_flag(shell: &str) -> &'static str {
    if shell.ends_with("cmd") || shell.ends_with("cmd.exe") {
        "/C"
    } else {
        "-c"
    }
}

/// Run `command` through the user's shell in `cwd`, capturing output.
pub fn run_shell(command: &str, cwd: &Path) -> ShellResult<ShellOutput> {
    let shell = user_shell();
    debug!("shell: {shell} {} {command}", shell_flag(&shell));
    let out = Command::new(&shell)
        .arg(shell_flag(&shell))
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ShellError::handler("sh", format!("cannot run {shell}: {e}")))?;
    Ok(ShellOutput {
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        status: out.status.code().unwrap_or(SIGNAL_STATUS),
    })
}

/// Start an interactive shell in `cwd` and wait for it to exit.
pub fn interactive_shell(cwd: &Path) -> ShellResult<i32> {
    let shell = user_shell();
    let status = Command::new(&shell)
        .current_dir(cwd)
        .status()
        .map_err(|e| ShellError::handler("sh", format!("cannot run {shell}: {e}")))?;
    Ok(status.code().unwrap_or(SIGNAL_STATUS))
}

/// Open `path` in `editor` and wait for it to exit.
pub fn run_editor(editor: &str, path: &Path) -> ShellResult<i32> {
    let status = Command::new(editor)
        .arg(path)
        .status()
        .map_err(|e| ShellError::handler("edt", format!("editor '{editor}' could not start: {e}")))?;
    Ok(status.code().unwrap_or(SIGNAL_STATUS))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_not_found() {
        let err = run_external("sigil-definitely-not-a-program", &[], Path::new(".")).unwrap_err();
        match err {
            ShellError::CommandNotFound { name, detail } => {
                assert_eq!(name, "sigil-definitely-not-a-program");
                assert!(detail.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn external_exit_status() {
        let status = run_external("sh", &["-c".into(), "exit 3".into()], Path::new(".")).unwrap();
        assert_eq!(status, 3);
    }

    #[test]
    fn shell_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_shell("echo hi; echo oops 1>&2", dir.path()).unwrap();
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.status, 0);
    }
}
