//! Runtime settings.
//!
//! Resolved once at startup from the environment:
//!
//! | Variable           | Setting                     | Default                      |
//! |--------------------|-----------------------------|------------------------------|
//! | `SIGIL_HOME`       | profile directory           | platform config dir          |
//! | `SIGIL_PROFILE`    | starting profile            | `default`                    |
//! | `SIGIL_UNDO_LIMIT` | undo capacity               | 200                          |
//! | `SIGIL_EDITOR`     | editor for `edt`            | `$EDITOR`, else nano/notepad |
//!
//! Malformed values produce a [`ConfigError`] and leave the default in place.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::journal::DEFAULT_UNDO_LIMIT;
use crate::script::expand::DEFAULT_ALIAS_DEPTH;

/// Default maximum number of nested execution frames.
pub const DEFAULT_MAX_FRAMES: usize = 512;

/// Name of the profile used when none is selected.
pub const DEFAULT_PROFILE: &str = "default";

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal problem with one setting.
#[derive(Debug)]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Interpreter and session settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `.sigilrc` profile files.
    pub home: PathBuf,
    /// Profile loaded at startup.
    pub profile: String,
    /// Undo journal capacity.
    pub undo_limit: usize,
    /// Alias re-expansion bound.
    pub alias_depth: usize,
    /// Maximum nested frames (loops, cases, calls, scripts).
    pub max_frames: usize,
    /// Editor launched by `edt`.
    pub editor: String,
    /// Run unknown command names as external programs.
    pub external_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: default_home(),
            profile: DEFAULT_PROFILE.to_owned(),
            undo_limit: DEFAULT_UNDO_LIMIT,
            alias_depth: DEFAULT_ALIAS_DEPTH,
            max_frames: DEFAULT_MAX_FRAMES,
            editor: default_editor().to_owned(),
            external_fallback: true,
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let mut errors = Vec::new();

        if let Some(home) = lookup("SIGIL_HOME").filter(|s| !s.trim().is_empty()) {
            settings.home = PathBuf::from(home);
        }
        if let Some(profile) = lookup("SIGIL_PROFILE").filter(|s| !s.trim().is_empty()) {
            settings.profile = profile.trim().to_owned();
        }
        if let Some(raw) = lookup("SIGIL_UNDO_LIMIT") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => settings.undo_limit = n,
                _ => errors.push(ConfigError {
                    key: "SIGIL_UNDO_LIMIT".into(),
                    message: format!("expected a positive integer, got '{raw}'"),
                }),
            }
        }
        if let Some(editor) = lookup("SIGIL_EDITOR")
            .or_else(|| lookup("EDITOR"))
            .filter(|s| !s.trim().is_empty())
        {
            settings.editor = editor;
        }

        (settings, errors)
    }
}

fn default_home() -> PathBuf {
    ProjectDirs::from("", "", "sigil")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".sigil"))
}

fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "nano"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(pairs: &[(&str, &str)]) -> (Settings, Vec<ConfigError>) {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let (s, errors) = resolve(&[]);
        assert!(errors.is_empty());
        assert_eq!(s.profile, "default");
        assert_eq!(s.undo_limit, 200);
        assert_eq!(s.alias_depth, 16);
        assert_eq!(s.max_frames, 512);
        assert!(s.external_fallback);
    }

    #[test]
    fn overrides() {
        let (s, errors) = resolve(&[
            ("SIGIL_HOME", "/tmp/sigil-home"),
            ("SIGIL_PROFILE", "work"),
            ("SIGIL_UNDO_LIMIT", "5"),
            ("EDITOR", "vi"),
        ]);
        assert!(errors.is_empty());
        assert_eq!(s.home, PathBuf::from("/tmp/sigil-home"));
        assert_eq!(s.profile, "work");
        assert_eq!(s.undo_limit, 5);
        assert_eq!(s.editor, "vi");
    }

    #[test]
    fn sigil_editor_wins() {
        let (s, _) = resolve(&[("SIGIL_EDITOR", "micro"), ("EDITOR", "vi")]);
        assert_eq!(s.editor, "micro");
    }

    #[test]
    fn bad_undo_limit_keeps_default() {
        let (s, errors) = resolve(&[("SIGIL_UNDO_LIMIT", "lots")]);
        assert_eq!(s.undo_limit, 200);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("SIGIL_UNDO_LIMIT:"));
    }
}
