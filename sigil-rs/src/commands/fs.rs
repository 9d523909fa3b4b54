//! Filesystem commands.
//!
//! Every mutation records a journal [`Action`] so `undo`/`redo` can reverse
//! it.  Whatever a command is about to destroy is moved into the backup
//! store first; `edt` copies instead, since the file must stay in place for
//! the editor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::commands::usage;
use crate::error::{ShellError, ShellResult};
use crate::journal::backup::{copy_tree, move_path, tree_size};
use crate::journal::Action;
use crate::process;

/// Register filesystem commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(MkCommand);
    registry.register(CpyCommand);
    registry.register(DltCommand);
    registry.register(MoveCommand);
    registry.register(RenmCommand);
    registry.register(EdtCommand);
    registry.register(FmtCommand);
    registry.register(CdCommand);
    registry.register(PwdCommand);
    registry.register(DirlookCommand);
    registry.register(ExistsCommand);
    registry.register(SizCommand);
    registry.register(UndoCommand);
    registry.register(RedoCommand);
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn create_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// `path` with symlinks and `..` resolved, as far as it exists.
fn canonical_target(path: &Path) -> PathBuf {
    if let Ok(p) = fs::canonicalize(path) {
        return p;
    }
    match (path.parent().map(fs::canonicalize), path.file_name()) {
        (Some(Ok(parent)), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}

/// Refuse transfers that would destroy their own source.
fn check_transfer(command: &str, src: &Path, dst: &Path) -> ShellResult {
    let (from, to) = (canonical_target(src), canonical_target(dst));
    if from == to {
        return Err(ShellError::handler(command, "source and destination are the same"));
    }
    if src.is_dir() && to.starts_with(&from) {
        return Err(ShellError::handler(command, "cannot copy or move a directory into itself"));
    }
    Ok(())
}

/// Move whatever is at `target` aside, then run `mutate`.  If `mutate`
/// fails the original is put back and the error returned.
fn guarded<F>(ctx: &mut CommandContext<'_>, target: &Path, mutate: F) -> ShellResult<Option<PathBuf>>
where
    F: FnOnce() -> io::Result<()>,
{
    let backup = ctx.session.journal.move_aside(target)?;
    if let Err(e) = mutate() {
        if let Err(re) = ctx.session.journal.restore_aside(target, backup) {
            warn!("could not restore {}: {re}", target.display());
        }
        return Err(e.into());
    }
    Ok(backup)
}

/// Topmost ancestor of `path` (or `path` itself) that does not exist yet.
fn first_missing(path: &Path) -> PathBuf {
    let mut top = path.to_path_buf();
    while let Some(parent) = top.parent() {
        if parent.as_os_str().is_empty() || exists(parent) {
            break;
        }
        top = parent.to_path_buf();
    }
    top
}

/// Journaled move of `src` onto `dst`, shared by `move file` and `renm`.
fn journaled_move(ctx: &mut CommandContext<'_>, command: &str, src: &str, dst: &str) -> ShellResult<CommandOutput> {
    let src = ctx.session.resolve(src);
    let dst = ctx.session.resolve(dst);
    if !exists(&src) {
        return Err(ShellError::handler(command, format!("source does not exist: {}", src.display())));
    }
    check_transfer(command, &src, &dst)?;
    let dst_existed = exists(&dst);
    let backup = guarded(ctx, &dst, || move_path(&src, &dst))?;
    ctx.session.journal.push(Action::Move { src, dst, dst_existed, backup });
    Ok(CommandOutput::text("ok"))
}

// ── mk ────────────────────────────────────────────────────────────────────────

struct MkCommand;

impl Command for MkCommand {
    fn name(&self) -> &str {
        "mk"
    }

    fn help(&self) -> &str {
        "mk dir <name> | mk file <name.ext> [content]\n  Create a directory or file (undoable)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let (kind, target, content) = match args {
            [kind, target, content @ ..] => (kind.as_str(), target, content),
            _ => return Err(usage(self.name(), self.help())),
        };
        let path = ctx.session.resolve(target);
        match kind {
            "dir" => {
                let existed = exists(&path);
                // Undo removes every directory this call created.
                let created = first_missing(&path);
                if !existed {
                    fs::create_dir_all(&path)?;
                }
                let path = if existed { path } else { created };
                ctx.session.journal.push(Action::CreateDir { path, existed, backup: None });
            }
            "file" => {
                if path.is_dir() {
                    return Err(ShellError::handler(self.name(), format!("is a directory: {}", path.display())));
                }
                let existed = exists(&path);
                let text = content.join(" ");
                let backup = guarded(ctx, &path, || {
                    create_parent(&path)?;
                    fs::write(&path, &text)
                })?;
                ctx.session.journal.push(Action::CreateFile { path, existed, backup });
            }
            other => {
                return Err(ShellError::handler(self.name(), format!("unknown mk target: {other}")));
            }
        }
        Ok(CommandOutput::text("ok"))
    }
}

// ── cpy ───────────────────────────────────────────────────────────────────────

struct CpyCommand;

impl Command for CpyCommand {
    fn name(&self) -> &str {
        "cpy"
    }

    fn help(&self) -> &str {
        "cpy <src> <dst>\n  Copy a file or directory (undoable)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [src, dst, ..] = args else {
            return Err(usage(self.name(), self.help()));
        };
        let src = ctx.session.resolve(src);
        let dst = ctx.session.resolve(dst);
        if !src.exists() {
            return Err(ShellError::handler(self.name(), format!("source does not exist: {}", src.display())));
        }
        check_transfer(self.name(), &src, &dst)?;
        let dst_existed = exists(&dst);
        if src.is_dir() && dst_existed {
            return Err(ShellError::handler(
                self.name(),
                "destination exists (for directory copy), operation aborted",
            ));
        }
        let backup = guarded(ctx, &dst, || copy_tree(&src, &dst))?;
        ctx.session.journal.push(Action::Copy { src, dst, dst_existed, backup });
        Ok(CommandOutput::text("ok"))
    }
}

// ── dlt ───────────────────────────────────────────────────────────────────────

struct DltCommand;

impl Command for DltCommand {
    fn name(&self) -> &str {
        "dlt"
    }

    fn help(&self) -> &str {
        "dlt <path>\n  Delete a file or directory (undoable)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let path = ctx.session.resolve(target);
        if !exists(&path) {
            return Err(ShellError::handler(self.name(), format!("path does not exist: {}", path.display())));
        }
        let backup = ctx.session.journal.move_aside(&path)?;
        ctx.session.journal.push(Action::Delete { path, backup });
        Ok(CommandOutput::text("ok"))
    }
}

// ── move ──────────────────────────────────────────────────────────────────────

struct MoveCommand;

impl Command for MoveCommand {
    fn name(&self) -> &str {
        "move"
    }

    fn help(&self) -> &str {
        "move file <src> <dst>\n  Move or rename a file (undoable)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        match args {
            [kind, src, dst, ..] if kind == "file" => journaled_move(ctx, self.name(), src, dst),
            _ => Err(usage(self.name(), self.help())),
        }
    }
}

// ── renm ──────────────────────────────────────────────────────────────────────

struct RenmCommand;

impl Command for RenmCommand {
    fn name(&self) -> &str {
        "renm"
    }

    fn aliases(&self) -> &[&str] {
        &["rename"]
    }

    fn help(&self) -> &str {
        "renm <old> <new>\n  Rename (same as move file <old> <new>)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let [src, dst, ..] = args else {
            return Err(usage(self.name(), self.help()));
        };
        journaled_move(ctx, self.name(), src, dst)
    }
}

// ── edt ───────────────────────────────────────────────────────────────────────

struct EdtCommand;

impl Command for EdtCommand {
    fn name(&self) -> &str {
        "edt"
    }

    fn help(&self) -> &str {
        "edt <path>\n  Edit a file with SIGIL_EDITOR (or nano/notepad).  The edit is undoable."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let path = ctx.session.resolve(target);
        if !exists(&path) {
            create_parent(&path)?;
            fs::write(&path, "")?;
        }
        let backup = ctx.session.journal.copy_aside(&path)?;
        let status = process::run_editor(&ctx.session.settings.editor, &path)?;
        ctx.session.journal.push(Action::Edit { path, backup });
        Ok(CommandOutput { text: "ok".into(), status })
    }
}

// ── fmt ───────────────────────────────────────────────────────────────────────

/// `text` with trailing whitespace removed from every line and exactly one
/// final newline.
pub fn tidy(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let mut out = lines.join("\n").trim_end().to_string();
    out.push('\n');
    out
}

struct FmtCommand;

impl Command for FmtCommand {
    fn name(&self) -> &str {
        "fmt"
    }

    fn help(&self) -> &str {
        "fmt <file>\n  Strip trailing whitespace from each line (undoable)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let path = ctx.session.resolve(target);
        if !path.is_file() {
            return Ok(CommandOutput::fail(format!("file not found: {}", path.display())));
        }
        let text = tidy(&fs::read_to_string(&path)?);
        let backup = ctx.session.journal.copy_aside(&path)?;
        if let Err(e) = fs::write(&path, text) {
            if let Err(re) = ctx.session.journal.restore_aside(&path, backup) {
                warn!("could not restore {}: {re}", path.display());
            }
            return Err(e.into());
        }
        ctx.session.journal.push(Action::Edit { path: path.clone(), backup });
        Ok(CommandOutput::text(format!("formatted: {}", path.display())))
    }
}

// ── cd / pwd ──────────────────────────────────────────────────────────────────

struct CdCommand;

impl Command for CdCommand {
    fn name(&self) -> &str {
        "cd"
    }

    fn help(&self) -> &str {
        "cd [path]\n  Change the current directory (no argument prints it)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Ok(CommandOutput::text(ctx.session.cwd.display().to_string()));
        };
        let path = ctx.session.resolve(target);
        if !path.is_dir() {
            return Err(ShellError::handler(self.name(), format!("not a directory: {}", path.display())));
        }
        let path: PathBuf = fs::canonicalize(&path).unwrap_or(path);
        ctx.notice(&format!("CWD: {}", path.display()));
        ctx.session.cwd = path;
        Ok(CommandOutput::ok())
    }
}

struct PwdCommand;

impl Command for PwdCommand {
    fn name(&self) -> &str {
        "pwd"
    }

    fn help(&self) -> &str {
        "pwd\n  Print the current directory"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        Ok(CommandOutput::text(ctx.session.cwd.display().to_string()))
    }
}

struct DirlookCommand;

impl Command for DirlookCommand {
    fn name(&self) -> &str {
        "dirlook"
    }

    fn help(&self) -> &str {
        "dirlook\n  List the entries of the current directory"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        let mut names = fs::read_dir(&ctx.session.cwd)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        let mut text = format!("CWD: {}", ctx.session.cwd.display());
        for name in names {
            text.push('\n');
            text.push_str(&name);
        }
        Ok(CommandOutput::text(text))
    }
}

// ── exists / siz ──────────────────────────────────────────────────────────────

struct ExistsCommand;

impl Command for ExistsCommand {
    fn name(&self) -> &str {
        "exists"
    }

    fn help(&self) -> &str {
        "exists <path>\n  Print 'yes' if path exists, 'no' otherwise; sets last=0 for yes, last=1 for no"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        if ctx.session.resolve(target).exists() {
            Ok(CommandOutput::text("yes"))
        } else {
            Ok(CommandOutput::fail("no"))
        }
    }
}

struct SizCommand;

impl Command for SizCommand {
    fn name(&self) -> &str {
        "siz"
    }

    fn aliases(&self) -> &[&str] {
        &["size"]
    }

    fn help(&self) -> &str {
        "siz <file|dir>\n  Show size in bytes (directories are summed recursively)"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        let Some(target) = args.first() else {
            return Err(usage(self.name(), self.help()));
        };
        let path = ctx.session.resolve(target);
        if !path.exists() {
            return Ok(CommandOutput::fail("not found"));
        }
        Ok(CommandOutput::text(tree_size(&path)?.to_string()))
    }
}

// ── undo / redo ───────────────────────────────────────────────────────────────

struct UndoCommand;

impl Command for UndoCommand {
    fn name(&self) -> &str {
        "undo"
    }

    fn help(&self) -> &str {
        "undo\n  Undo the last filesystem change"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        match ctx.session.journal.undo()? {
            Some(desc) => Ok(CommandOutput::text(format!("undone: {desc}"))),
            None => Ok(CommandOutput::fail("nothing to undo")),
        }
    }
}

struct RedoCommand;

impl Command for RedoCommand {
    fn name(&self) -> &str {
        "redo"
    }

    fn help(&self) -> &str {
        "redo\n  Redo the last undone change"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> ShellResult<CommandOutput> {
        match ctx.session.journal.redo()? {
            Some(desc) => Ok(CommandOutput::text(format!("redone: {desc}"))),
            None => Ok(CommandOutput::fail("nothing to redo")),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
