//! Backup storage for the undo journal.
//!
//! A [`BackupStore`] hands out unique, isolated locations and moves or
//! copies filesystem objects in and out of them.  Callers treat the
//! returned paths as opaque handles.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Session-scoped storage for backed-up files and directories.
pub trait BackupStore {
    /// Allocate a fresh location for an object named like `original`.
    ///
    /// The location itself does not exist yet; its parent does.
    fn allocate(&mut self, original: &Path) -> io::Result<PathBuf>;

    /// Move `path` into the store ("move-aside").
    fn move_into(&mut self, path: &Path) -> io::Result<PathBuf> {
        let slot = self.allocate(path)?;
        move_path(path, &slot)?;
        Ok(slot)
    }

    /// Copy `path` into the store, leaving the original in place ("copy-aside").
    fn copy_into(&mut self, path: &Path) -> io::Result<PathBuf> {
        let slot = self.allocate(path)?;
        copy_tree(path, &slot)?;
        Ok(slot)
    }

    /// Move a stored object back out to `dest`.
    fn move_out(&mut self, backup: &Path, dest: &Path) -> io::Result<()> {
        move_path(backup, dest)
    }

    /// Copy a stored object out to `dest`, keeping the backup.
    fn copy_out(&mut self, backup: &Path, dest: &Path) -> io::Result<()> {
        copy_tree(backup, dest)
    }
}

// ── TempBackupStore ───────────────────────────────────────────────────────────

/// Backup store rooted in a temporary directory removed on drop.
#[derive(Debug)]
pub struct TempBackupStore {
    root: TempDir,
    next: u64,
}

impl TempBackupStore {
    pub fn new() -> io::Result<Self> {
        let root = tempfile::Builder::new().prefix("sigil-undo-").tempdir()?;
        Ok(Self { root, next: 0 })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl BackupStore for TempBackupStore {
    fn allocate(&mut self, original: &Path) -> io::Result<PathBuf> {
        self.next += 1;
        let dir = self.root.path().join(self.next.to_string());
        fs::create_dir_all(&dir)?;
        let name = original
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "object".into());
        Ok(dir.join(name))
    }
}

// ── Filesystem helpers ────────────────────────────────────────────────────────

/// Move a file or directory, falling back to copy + remove across devices.
pub fn move_path(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) if src.exists() => {
            copy_tree(src, dst)?;
            remove_path(src)
        }
        Err(e) => Err(e),
    }
}

/// Recursively copy a file or directory.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::metadata(src)?.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_tree(&entry.path(), &dst.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(src, dst).map(|_| ())
    }
}

/// Remove a file or a directory tree.
pub fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Total size in bytes of a file or directory tree.
pub fn tree_size(path: &Path) -> io::Result<u64> {
    let meta = fs::metadata(path)?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }
    let mut total = 0;
    // Unreadable entries are skipped.
    for entry in fs::read_dir(path)?.flatten() {
        total += tree_size(&entry.path()).unwrap_or(0);
    }
    Ok(total)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_unique() {
        let mut store = TempBackupStore::new().unwrap();
        let a = store.allocate(Path::new("/x/file.txt")).unwrap();
        let b = store.allocate(Path::new("/y/file.txt")).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(store.root()));
        assert_eq!(a.file_name().unwrap(), "file.txt");
    }

    #[test]
    fn move_into_and_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, "hello").unwrap();

        let mut store = TempBackupStore::new().unwrap();
        let slot = store.move_into(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(&slot).unwrap(), "hello");

        store.move_out(&slot, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(!slot.exists());
    }

    #[test]
    fn copy_into_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        fs::write(&path, "data").unwrap();

        let mut store = TempBackupStore::new().unwrap();
        let slot = store.copy_into(&path).unwrap();
        assert!(path.exists());
        assert_eq!(fs::read_to_string(slot).unwrap(), "data");
    }

    #[test]
    fn copy_tree_recursive_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), "aaa").unwrap();
        fs::write(src.join("sub/b.txt"), "bb").unwrap();

        let dst = dir.path().join("dst");
        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "bb");
        assert_eq!(tree_size(&dst).unwrap(), 5);
    }
}
