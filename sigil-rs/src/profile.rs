//! Profile persistence.
//!
//! A profile is an rc script replayed through the interpreter on load.
//! Profile `default` lives at `<home>/.sigilrc`, any other profile `name` at
//! `<home>/.sigilrc.<name>`.  Saving writes one definition command per entry:
//!
//! ```text
//! # Sigil RC - profile: default
//! alia ll dirlook
//! let greeting = "hello world"
//! let -r answer = 42
//! export greeting
//! fn hello say hi ;; say there
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::DEFAULT_PROFILE;
use crate::macros::{join_body, AliasTable, FunctionTable};
use crate::script::lexer::quote;
use crate::script::value::Value;
use crate::var::{VarStore, STATUS_VARS};

/// Session variables that are never written to a profile.
pub const SESSION_VARS: [&str; 2] = ["script.file", "script.dir"];

const RC_NAME: &str = ".sigilrc";

/// Profile files under one home directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    home: PathBuf,
}

impl ProfileStore {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Path of profile `name`'s rc file.
    pub fn path(&self, name: &str) -> PathBuf {
        if name == DEFAULT_PROFILE {
            self.home.join(RC_NAME)
        } else {
            self.home.join(format!("{RC_NAME}.{name}"))
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Known profiles, sorted; `default` is always listed.
    pub fn list(&self) -> Vec<String> {
        let mut names = vec![DEFAULT_PROFILE.to_owned()];
        if let Ok(entries) = fs::read_dir(&self.home) {
            let prefix = format!("{RC_NAME}.");
            for entry in entries.flatten() {
                let file = entry.file_name();
                let Some(file) = file.to_str() else { continue };
                if let Some(name) = file.strip_prefix(&prefix) {
                    if !name.is_empty() && !name.ends_with(".bak") {
                        names.push(name.to_owned());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }

    /// Create an empty profile.  Fails if it already exists.
    pub fn create(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.path(name);
        fs::create_dir_all(&self.home)?;
        fs::OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(path)
    }

    /// Delete a profile file.
    pub fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path(name))
    }

    /// Read a profile's text; `Ok(None)` when it does not exist.
    pub fn read(&self, name: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(name)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the definition tables to profile `name`.
    pub fn save(
        &self,
        name: &str,
        vars: &VarStore,
        aliases: &AliasTable,
        functions: &FunctionTable,
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.home)?;
        let path = self.path(name);
        fs::write(&path, render(name, vars, aliases, functions))?;
        info!("saved profile '{name}' to {}", path.display());
        Ok(path)
    }
}

/// Render the definition tables as rc script text.
pub fn render(name: &str, vars: &VarStore, aliases: &AliasTable, functions: &FunctionTable) -> String {
    let mut out = format!("# Sigil RC - profile: {name}\n");

    if !aliases.is_empty() {
        out.push_str("\n# Aliases\n");
        for (k, v) in aliases.sorted() {
            out.push_str(&format!("alia {k} {v}\n"));
        }
    }

    let persisted: Vec<(&str, &Value)> = vars
        .sorted()
        .into_iter()
        .filter(|(k, _)| !STATUS_VARS.contains(k) && !SESSION_VARS.contains(k))
        .collect();
    if !persisted.is_empty() {
        out.push_str("\n# Variables\n");
        for (k, v) in &persisted {
            let flag = if vars.is_readonly(k) { "-r " } else { "" };
            let value = match v {
                Value::Str(s) => quote(s),
                other => other.to_string(),
            };
            out.push_str(&format!("let {flag}{k} = {value}\n"));
        }
        for (k, _) in persisted.iter().filter(|(k, _)| vars.is_exported(k)) {
            out.push_str(&format!("export {k}\n"));
        }
    }

    if !functions.is_empty() {
        out.push_str("\n# Functions\n");
        for (k, body) in functions.sorted() {
            out.push_str(&format!("fn {k} {}\n", join_body(body)));
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_paths() {
        let store = ProfileStore::new("/h");
        assert_eq!(store.path("default"), PathBuf::from("/h/.sigilrc"));
        assert_eq!(store.path("work"), PathBuf::from("/h/.sigilrc.work"));
    }

    #[test]
    fn create_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        store.create("work").unwrap();
        assert!(store.create("work").is_err());
        assert_eq!(store.list(), vec!["default", "work"]);
        store.delete("work").unwrap();
        assert_eq!(store.list(), vec!["default"]);
    }

    #[test]
    fn render_definitions() {
        let mut vars = VarStore::new();
        vars.set("SIGIL_PROFILE_GREETING", Value::Str("say \"hi\" $x".into()), false).unwrap();
        vars.set("answer", Value::Int(42), true).unwrap();
        vars.set("last", Value::Int(0), false).unwrap();
        vars.set("script.file", Value::Str("/x".into()), false).unwrap();
        vars.export("SIGIL_PROFILE_GREETING");
        let mut aliases = AliasTable::new();
        aliases.define("ll", "dirlook");
        let mut functions = FunctionTable::new();
        functions.define("hello", vec!["say hi".into(), "say there".into()]);

        let text = render("default", &vars, &aliases, &functions);
        assert!(text.starts_with("# Sigil RC - profile: default\n"));
        assert!(text.contains("alia ll dirlook\n"));
        assert!(text.contains("let -r answer = 42\n"));
        assert!(text.contains("let SIGIL_PROFILE_GREETING = \"say \\\"hi\\\" \\$x\"\n"));
        assert!(text.contains("export SIGIL_PROFILE_GREETING\n"));
        assert!(text.contains("fn hello say hi ;; say there\n"));
        assert!(!text.contains("let last"));
        assert!(!text.contains("script.file"));
    }

    #[test]
    fn read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(store.read("nope").unwrap().is_none());
    }
}
