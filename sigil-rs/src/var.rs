//! Variable store.
//!
//! Holds the session's variables plus two name subsets:
//!
//! - **readonly** names reject writes unless the write carries the readonly
//!   flag again, and can never be unset;
//! - **exported** names are mirrored into the process environment so that
//!   external commands see them.
//!
//! Lookups used by the expander fall back to the process environment when a
//! name is not defined here (see [`VarLookup`]).

use std::collections::{HashMap, HashSet};

use crate::error::{ShellError, ShellResult};
use crate::script::value::Value;

/// Names written by the last-status convention.
pub const STATUS_VARS: [&str; 3] = ["last", "LAST", "LAST_EXIT"];

/// Read access used by the expander and condition evaluator.
pub trait VarLookup {
    /// Stringified value of `name`: store first, then process environment.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Whether `name` is defined in the store itself (no environment fallback).
    fn is_defined(&self, name: &str) -> bool;

    /// Stringified value from the store only.
    fn stored(&self, name: &str) -> Option<String>;
}

/// Session variable table.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: HashMap<String, Value>,
    readonly: HashSet<String>,
    exported: HashSet<String>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    ///
    /// Fails with [`ShellError::ReadOnly`] when `name` is readonly and this
    /// write does not carry the readonly flag.  A plain write to a writable
    /// name leaves it writable; a readonly write marks it readonly.
    pub fn set(&mut self, name: &str, value: Value, readonly: bool) -> ShellResult {
        if self.readonly.contains(name) && !readonly {
            return Err(ShellError::ReadOnly(name.to_owned()));
        }
        if self.exported.contains(name) {
            std::env::set_var(name, value.to_string());
        }
        self.vars.insert(name.to_owned(), value);
        if readonly {
            self.readonly.insert(name.to_owned());
        }
        Ok(())
    }

    /// Set a session-maintained variable, bypassing readonly protection.
    pub fn set_forced(&mut self, name: &str, value: Value) {
        self.readonly.remove(name);
        self.vars.insert(name.to_owned(), value);
    }

    /// Write the last-status variables, bypassing readonly protection.
    pub fn set_status(&mut self, code: i32) {
        for name in STATUS_VARS {
            self.vars.insert(name.to_owned(), Value::Int(i64::from(code)));
        }
    }

    /// Current last status (0 when never set).
    pub fn status(&self) -> i32 {
        match self.vars.get("last") {
            Some(Value::Int(n)) => i32::try_from(*n).unwrap_or(1),
            _ => 0,
        }
    }

    /// Get a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Remove a variable.  Returns `Ok(false)` if it did not exist.
    pub fn unset(&mut self, name: &str) -> ShellResult<bool> {
        if self.readonly.contains(name) {
            return Err(ShellError::ReadOnly(name.to_owned()));
        }
        self.exported.remove(name);
        Ok(self.vars.remove(name).is_some())
    }

    /// Mark `name` exported and mirror it into the environment.
    ///
    /// Returns `false` if the variable is not defined.
    pub fn export(&mut self, name: &str) -> bool {
        let Some(value) = self.vars.get(name) else {
            return false;
        };
        std::env::set_var(name, value.to_string());
        self.exported.insert(name.to_owned());
        true
    }

    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly.contains(name)
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exported.contains(name)
    }

    /// All variables sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut v: Vec<(&str, &Value)> = self.vars.iter().map(|(k, v)| (k.as_str(), v)).collect();
        v.sort_by_key(|(k, _)| *k);
        v
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VarLookup for VarStore {
    fn lookup(&self, name: &str) -> Option<String> {
        self.stored(name).or_else(|| std::env::var(name).ok())
    }

    fn is_defined(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn stored(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(Value::to_string)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
