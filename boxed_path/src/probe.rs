//! Filesystem inspection used by the validation engine.
//!
//! The engine only ever needs two questions answered about a path: what kind of
//! entry it is (without following a final symlink) and, for symlinks, what the
//! link points to. Keeping those behind [`FsProbe`] lets the algorithm run
//! against the real OS or against [`crate::test_utils::SimulatedFs`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Kind of a directory entry, as reported without following a final symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Minimal stat/readlink capability.
pub trait FsProbe: Send + Sync + fmt::Debug {
    /// `lstat`-like inspection of `path`.
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Raw target of the symlink at `path`, exactly as stored in the link.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
}

impl<T: FsProbe + ?Sized> FsProbe for Arc<T> {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        (**self).entry_kind(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).read_link(path)
    }
}

/// [`FsProbe`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProbe;

impl FsProbe for OsProbe {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = std::fs::symlink_metadata(path)?.file_type();
        Ok(if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_os_probe_reports_kinds() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(OsProbe.entry_kind(temp.path()).unwrap(), EntryKind::Directory);
        assert_eq!(OsProbe.entry_kind(&file).unwrap(), EntryKind::File);
        assert_eq!(
            OsProbe
                .entry_kind(&temp.path().join("missing"))
                .unwrap_err()
                .kind(),
            io::ErrorKind::NotFound
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_os_probe_does_not_follow_final_link() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("dangling");
        std::os::unix::fs::symlink("nowhere/at/all", &link).unwrap();

        assert_eq!(OsProbe.entry_kind(&link).unwrap(), EntryKind::Symlink);
        assert_eq!(
            OsProbe.read_link(&link).unwrap(),
            PathBuf::from("nowhere/at/all")
        );
    }
}
