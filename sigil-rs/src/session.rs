//! Session state shared by the interpreter and every command.
//!
//! One [`Session`] owns the variable store, alias and function tables, undo
//! journal, working directory, current script context and active profile.
//! It is passed explicitly to command handlers through
//! [`CommandContext`](crate::command::CommandContext).

use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use crate::config::Settings;
use crate::journal::Journal;
use crate::macros::{AliasTable, FunctionTable};
use crate::profile::ProfileStore;
use crate::script::value::Value;
use crate::var::VarStore;

/// The script currently executing: its file and arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptInfo {
    pub file: Option<PathBuf>,
    pub args: Vec<String>,
}

impl ScriptInfo {
    pub fn new(file: Option<PathBuf>, args: Vec<String>) -> Self {
        Self { file, args }
    }

    /// Directory containing the script file.
    pub fn dir(&self) -> Option<&Path> {
        self.file.as_deref().and_then(Path::parent)
    }
}

/// Mutable shell state.
#[derive(Debug)]
pub struct Session {
    pub vars: VarStore,
    pub aliases: AliasTable,
    pub functions: FunctionTable,
    pub journal: Journal,
    pub cwd: PathBuf,
    pub settings: Settings,
    pub profiles: ProfileStore,
    /// Active profile name.
    pub profile: String,
    /// True while a profile is being replayed (suspends autosave).
    pub loading: bool,
    /// Whether definition commands write the profile back.
    pub persist: bool,
    script: ScriptInfo,
}

impl Session {
    pub fn new(settings: Settings) -> io::Result<Self> {
        let journal = Journal::with_temp_store(settings.undo_limit)?;
        let cwd = std::env::current_dir()?;
        let mut session = Self {
            vars: VarStore::new(),
            aliases: AliasTable::new(),
            functions: FunctionTable::new(),
            journal,
            cwd,
            profiles: ProfileStore::new(&settings.home),
            profile: settings.profile.clone(),
            settings,
            loading: false,
            persist: true,
            script: ScriptInfo::default(),
        };
        session.sync_script_vars();
        Ok(session)
    }

    pub fn script(&self) -> &ScriptInfo {
        &self.script
    }

    /// Replace the script context, returning the previous one.
    pub fn set_script(&mut self, info: ScriptInfo) -> ScriptInfo {
        let prev = std::mem::replace(&mut self.script, info);
        self.sync_script_vars();
        prev
    }

    fn sync_script_vars(&mut self) {
        let file = self.script.file.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
        let dir = self.script.dir().map(|p| p.display().to_string()).unwrap_or_default();
        self.vars.set_forced("script.file", Value::Str(file));
        self.vars.set_forced("script.dir", Value::Str(dir));
    }

    /// Set the last-status variables.
    pub fn set_last(&mut self, status: i32) {
        self.vars.set_status(status);
    }

    /// Resolve `path` against the session working directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.join(p)
        }
    }

    /// Drop all variables, aliases and functions (the journal survives).
    pub fn clear_definitions(&mut self) {
        self.vars = VarStore::new();
        self.aliases = AliasTable::new();
        self.functions = FunctionTable::new();
        self.sync_script_vars();
    }

    /// Write the active profile unconditionally.
    pub fn save_profile(&self) -> io::Result<PathBuf> {
        self.profiles.save(&self.profile, &self.vars, &self.aliases, &self.functions)
    }

    /// Write the active profile after a definition change, unless a profile
    /// is loading or persistence is off.
    pub fn autosave(&self) {
        if self.loading || !self.persist {
            return;
        }
        if let Err(e) = self.save_profile() {
            warn!("autosave of profile '{}' failed: {e}", self.profile);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn session(home: &Path) -> Session {
        let settings = Settings { home: home.to_path_buf(), ..Settings::default() };
        Session::new(settings).unwrap()
    }

    #[test]
    fn script_vars_follow_script_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        assert_eq!(s.vars.get("script.file"), Some(&Value::Str(String::new())));
        let prev = s.set_script(ScriptInfo::new(Some(PathBuf::from("/a/b/run.sig")), vec!["x".into()]));
        assert_eq!(prev, ScriptInfo::default());
        assert_eq!(s.vars.get("script.dir"), Some(&Value::Str("/a/b".into())));
        assert_eq!(s.script().args, vec!["x"]);
    }

    #[test]
    fn resolve_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.cwd = PathBuf::from("/work");
        assert_eq!(s.resolve("f.txt"), PathBuf::from("/work/f.txt"));
        assert_eq!(s.resolve("/abs"), PathBuf::from("/abs"));
    }

    #[test]
    fn autosave_respects_loading_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.aliases.define("ll", "pwd");

        s.loading = true;
        s.autosave();
        assert!(!s.profiles.exists("default"));

        s.loading = false;
        s.persist = false;
        s.autosave();
        assert!(!s.profiles.exists("default"));

        s.persist = true;
        s.autosave();
        assert!(s.profiles.exists("default"));
    }

    #[test]
    fn clear_keeps_journal_and_script_vars() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.vars.set("x", Value::Int(1), true).unwrap();
        s.journal.push(crate::journal::Action::Delete { path: "/p".into(), backup: None });
        s.clear_definitions();
        assert!(s.vars.get("x").is_none());
        assert!(s.vars.get("script.file").is_some());
        assert_eq!(s.journal.undo_len(), 1);
    }
}
