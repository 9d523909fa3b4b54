//! Transactional undo/redo journal.
//!
//! Destructive filesystem commands record an [`Action`] after mutating.
//! Each record carries a `backup` handle: the object that the *next*
//! transition (undo, or redo after an undo) will put back at the target
//! path.  A transition swaps the live object with that backup and yields a
//! new record whose backup is whatever it displaced, so undo and redo are
//! the same operation applied in opposite directions.
//!
//! ```text
//!   undo stack (bounded, oldest evicted)      redo stack
//!   ┌──────────────┐   undo()   ┌──────────────┐
//!   │ … a₂ a₁ a₀   │ ─────────▶ │ a₀'          │
//!   │              │ ◀───────── │              │
//!   └──────────────┘   redo()   └──────────────┘
//! ```
//!
//! Pushing a new action clears the redo stack.  The journal gives no
//! guarantees across actions or under concurrent external changes.

pub mod backup;

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::ShellResult;

use backup::{move_path, remove_path};
pub use backup::{BackupStore, TempBackupStore};

/// Default undo capacity.
pub const DEFAULT_UNDO_LIMIT: usize = 200;

// ── Action ────────────────────────────────────────────────────────────────────

/// A reversible filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `mk dir`.  Nothing to reverse when the directory already existed.
    CreateDir { path: PathBuf, existed: bool, backup: Option<PathBuf> },
    /// `mk file` (new or overwritten).
    CreateFile { path: PathBuf, existed: bool, backup: Option<PathBuf> },
    /// `cpy src dst`.
    Copy { src: PathBuf, dst: PathBuf, dst_existed: bool, backup: Option<PathBuf> },
    /// `move file src dst` / `renm`.
    Move { src: PathBuf, dst: PathBuf, dst_existed: bool, backup: Option<PathBuf> },
    /// `dlt`.
    Delete { path: PathBuf, backup: Option<PathBuf> },
    /// `edt` (contents copied aside before editing).
    Edit { path: PathBuf, backup: Option<PathBuf> },
}

/// Direction of a [`Move`](Action::Move) transition.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

impl Action {
    /// Short human-readable description.
    pub fn describe(&self) -> String {
        match self {
            Action::CreateDir { path, .. } => format!("mk dir {}", path.display()),
            Action::CreateFile { path, .. } => format!("mk file {}", path.display()),
            Action::Copy { src, dst, .. } => format!("cpy {} {}", src.display(), dst.display()),
            Action::Move { src, dst, .. } => format!("move {} {}", src.display(), dst.display()),
            Action::Delete { path, .. } => format!("dlt {}", path.display()),
            Action::Edit { path, .. } => format!("edt {}", path.display()),
        }
    }

    /// Apply one transition, returning the record for the opposite one.
    fn transition(&self, store: &mut dyn BackupStore, dir: Direction) -> io::Result<Action> {
        let mut next = self.clone();
        match &mut next {
            Action::CreateDir { existed: true, .. } => {}
            Action::CreateDir { path, backup, .. }
            | Action::CreateFile { path, backup, .. }
            | Action::Delete { path, backup }
            | Action::Edit { path, backup } => {
                *backup = swap(store, path, backup.take())?;
            }
            Action::Copy { dst, backup, .. } => {
                *backup = swap(store, dst, backup.take())?;
            }
            Action::Move { src, dst, backup, .. } => match dir {
                Direction::Backward => {
                    move_path(dst, src)?;
                    if let Some(old) = backup.as_deref() {
                        if let Err(e) = store.move_out(old, dst) {
                            if let Err(re) = move_path(src, dst) {
                                warn!("could not move {} back: {re}", src.display());
                            }
                            return Err(e);
                        }
                    }
                    *backup = None;
                }
                Direction::Forward => {
                    let displaced = aside(store, dst)?;
                    if let Err(e) = move_path(src, dst) {
                        put_back(store, dst, displaced);
                        return Err(e);
                    }
                    *backup = displaced;
                }
            },
        }
        Ok(next)
    }
}

/// Move whatever is at `path` aside, then put `restore` in its place.
fn swap(
    store: &mut dyn BackupStore,
    path: &Path,
    restore: Option<PathBuf>,
) -> io::Result<Option<PathBuf>> {
    let displaced = aside(store, path)?;
    if let Some(old) = restore {
        if let Err(e) = store.move_out(&old, path) {
            put_back(store, path, displaced);
            return Err(e);
        }
    }
    Ok(displaced)
}

/// Return a displaced object to `path`, clearing any partial leftovers.
///
/// Used after a failed step so the disk matches the record again.
fn restore_displaced(store: &mut dyn BackupStore, path: &Path, displaced: Option<PathBuf>) -> io::Result<()> {
    if path.symlink_metadata().is_ok() {
        remove_path(path)?;
    }
    match displaced {
        Some(slot) => store.move_out(&slot, path),
        None => Ok(()),
    }
}

fn put_back(store: &mut dyn BackupStore, path: &Path, displaced: Option<PathBuf>) {
    if let Err(e) = restore_displaced(store, path, displaced) {
        warn!("could not restore {}: {e}", path.display());
    }
}

fn aside(store: &mut dyn BackupStore, path: &Path) -> io::Result<Option<PathBuf>> {
    if path.symlink_metadata().is_ok() {
        store.move_into(path).map(Some)
    } else {
        Ok(None)
    }
}

// ── Journal ───────────────────────────────────────────────────────────────────

/// Bounded undo/redo stacks plus the backup store they reference.
pub struct Journal {
    undo: VecDeque<Action>,
    redo: Vec<Action>,
    limit: usize,
    store: Box<dyn BackupStore + Send>,
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("undo", &self.undo.len())
            .field("redo", &self.redo.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl Journal {
    pub fn new(limit: usize, store: Box<dyn BackupStore + Send>) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), limit, store }
    }

    /// Journal backed by a fresh temporary directory.
    pub fn with_temp_store(limit: usize) -> io::Result<Self> {
        Ok(Self::new(limit, Box::new(TempBackupStore::new()?)))
    }

    /// Record a completed action.
    pub fn push(&mut self, action: Action) {
        debug!("journal: {}", action.describe());
        self.undo.push_back(action);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Reverse the most recent action.  `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self) -> ShellResult<Option<String>> {
        let Some(action) = self.undo.pop_back() else {
            return Ok(None);
        };
        match action.transition(self.store.as_mut(), Direction::Backward) {
            Ok(inverse) => {
                let desc = action.describe();
                self.redo.push(inverse);
                Ok(Some(desc))
            }
            Err(e) => {
                self.undo.push_back(action);
                Err(e.into())
            }
        }
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self) -> ShellResult<Option<String>> {
        let Some(action) = self.redo.pop() else {
            return Ok(None);
        };
        match action.transition(self.store.as_mut(), Direction::Forward) {
            Ok(forward) => {
                let desc = action.describe();
                self.undo.push_back(forward);
                Ok(Some(desc))
            }
            Err(e) => {
                self.redo.push(action);
                Err(e.into())
            }
        }
    }

    /// Move `path` into the backup store if it exists.
    pub fn move_aside(&mut self, path: &Path) -> io::Result<Option<PathBuf>> {
        aside(self.store.as_mut(), path)
    }

    /// Put an object taken by [`move_aside`](Self::move_aside) back at
    /// `path` after the mutation it guarded failed.
    pub fn restore_aside(&mut self, path: &Path, backup: Option<PathBuf>) -> io::Result<()> {
        restore_displaced(self.store.as_mut(), path, backup)
    }

    /// Copy `path` into the backup store if it exists.
    pub fn copy_aside(&mut self, path: &Path) -> io::Result<Option<PathBuf>> {
        if path.exists() {
            self.store.copy_into(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most recent undoable action.
    pub fn peek_undo(&self) -> Option<&Action> {
        self.undo.back()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn journal(limit: usize) -> Journal {
        Journal::with_temp_store(limit).unwrap()
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut j = journal(4);
        assert_eq!(j.undo().unwrap(), None);
        assert_eq!(j.redo().unwrap(), None);
    }

    #[test]
    fn create_file_undo_redo_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("new.txt");
        let mut j = journal(10);

        fs::write(&p, "content").unwrap();
        j.push(Action::CreateFile { path: p.clone(), existed: false, backup: None });

        for _ in 0..2 {
            assert!(j.undo().unwrap().is_some());
            assert!(!p.exists());
            assert!(j.redo().unwrap().is_some());
            assert_eq!(fs::read_to_string(&p).unwrap(), "content");
        }
    }

    #[test]
    fn overwrite_restores_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f.txt");
        fs::write(&p, "old").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&p).unwrap();
        fs::write(&p, "new").unwrap();
        j.push(Action::CreateFile { path: p.clone(), existed: true, backup });

        j.undo().unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "old");
        j.redo().unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "new");
    }

    #[test]
    fn delete_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().join("tree");
        fs::create_dir_all(d.join("inner")).unwrap();
        fs::write(d.join("inner/x"), "x").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&d).unwrap();
        j.push(Action::Delete { path: d.clone(), backup });
        assert!(!d.exists());

        j.undo().unwrap();
        assert_eq!(fs::read_to_string(d.join("inner/x")).unwrap(), "x");
        j.redo().unwrap();
        assert!(!d.exists());
    }

    #[test]
    fn move_round_trip_with_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        fs::write(&src, "A").unwrap();
        fs::write(&dst, "B").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&dst).unwrap();
        move_path(&src, &dst).unwrap();
        j.push(Action::Move { src: src.clone(), dst: dst.clone(), dst_existed: true, backup });

        j.undo().unwrap();
        assert_eq!(fs::read_to_string(&src).unwrap(), "A");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "B");

        j.redo().unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "A");

        j.undo().unwrap();
        assert_eq!(fs::read_to_string(&src).unwrap(), "A");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "B");
    }

    #[test]
    fn existing_directory_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut j = journal(10);
        j.push(Action::CreateDir { path: dir.path().to_path_buf(), existed: true, backup: None });
        j.undo().unwrap();
        assert!(dir.path().is_dir());
    }

    #[test]
    fn push_evicts_oldest_beyond_limit() {
        let mut j = journal(3);
        for i in 0..4 {
            j.push(Action::Delete { path: PathBuf::from(format!("/p{i}")), backup: None });
        }
        assert_eq!(j.undo_len(), 3);
        // p0 was evicted; the oldest remaining is p1.
        assert_eq!(j.undo.front().map(Action::describe).as_deref(), Some("dlt /p1"));
    }

    #[test]
    fn push_clears_redo() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x");
        fs::write(&p, "1").unwrap();
        let mut j = journal(10);
        j.push(Action::CreateFile { path: p.clone(), existed: false, backup: None });
        j.undo().unwrap();
        assert_eq!(j.redo_len(), 1);
        j.push(Action::Edit { path: p, backup: None });
        assert_eq!(j.redo_len(), 0);
    }

    #[test]
    fn failed_restore_puts_live_object_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f.txt");
        fs::write(&p, "old").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&p).unwrap();
        j.push(Action::Delete { path: p.clone(), backup: backup.clone() });
        fs::write(&p, "recreated").unwrap();
        remove_path(&backup.unwrap()).unwrap();

        assert!(j.undo().is_err());
        assert_eq!(fs::read_to_string(&p).unwrap(), "recreated");
        assert_eq!(j.undo_len(), 1);
        assert_eq!(j.redo_len(), 0);
    }

    #[test]
    fn failed_move_undo_moves_back() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        fs::write(&src, "A").unwrap();
        fs::write(&dst, "B").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&dst).unwrap();
        move_path(&src, &dst).unwrap();
        j.push(Action::Move { src: src.clone(), dst: dst.clone(), dst_existed: true, backup: backup.clone() });
        remove_path(&backup.unwrap()).unwrap();

        assert!(j.undo().is_err());
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "A");
        assert_eq!(j.undo_len(), 1);
    }

    #[test]
    fn restore_aside_replaces_partial_target() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f.txt");
        fs::write(&p, "keep").unwrap();
        let mut j = journal(10);

        let backup = j.move_aside(&p).unwrap();
        fs::write(&p, "half").unwrap();
        j.restore_aside(&p, backup).unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "keep");
    }

    #[test]
    fn failed_transition_keeps_action() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("gone-src");
        let dst = dir.path().join("gone-dst");
        let mut j = journal(10);
        // Neither path exists, so moving dst back to src fails.
        j.push(Action::Move { src, dst, dst_existed: false, backup: None });
        assert!(j.undo().is_err());
        assert_eq!(j.undo_len(), 1);
        assert_eq!(j.redo_len(), 0);
    }
}
