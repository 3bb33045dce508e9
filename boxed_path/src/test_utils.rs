//! Test helper utilities for boxed_path.
//!
//! - [`SimulatedFs`]: an in-memory [`FsProbe`] for exercising the validation
//!   engine without touching the disk. It records every path it is asked about.
//! - [`TestSandbox`]: a scratch directory holding a `sandbox/` root and a
//!   sibling `outside/` directory, with helpers to populate both.
//!
//! These APIs are intended for test-only code paths.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;

use crate::path::BoxedPath;
use crate::probe::{EntryKind, FsProbe};
use crate::sandbox::{JailbreakPolicy, Result, Sandbox};

#[derive(Debug, Clone)]
enum Node {
    File,
    Dir,
    Symlink(PathBuf),
    Denied,
    Failing(io::ErrorKind),
}

/// In-memory filesystem answering `lstat`/`readlink` questions.
///
/// Paths are matched exactly; symlinks in intermediate components are not
/// followed (the validation engine never asks about such paths). Adding an
/// entry creates its missing ancestors as directories.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFs {
    nodes: BTreeMap<PathBuf, Node>,
    inspected: Arc<Mutex<Vec<PathBuf>>>,
}

impl SimulatedFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, path: impl Into<PathBuf>, node: Node) -> Self {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.parent().is_some() {
                self.nodes
                    .entry(ancestor.to_path_buf())
                    .or_insert(Node::Dir);
            }
        }
        self.nodes.insert(path, node);
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.insert(path, Node::Dir)
    }

    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.insert(path, Node::File)
    }

    pub fn with_symlink(self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.insert(link, Node::Symlink(target.into()))
    }

    /// Inspecting this path, or anything below it, fails with permission denied.
    pub fn with_denied(self, path: impl Into<PathBuf>) -> Self {
        self.insert(path, Node::Denied)
    }

    /// Inspecting this path fails with an error of `kind`.
    pub fn with_error(self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
        self.insert(path, Node::Failing(kind))
    }

    /// Every path passed to [`FsProbe::entry_kind`], in call order.
    pub fn inspected(&self) -> Vec<PathBuf> {
        self.inspected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, path: &Path) -> io::Result<&Node> {
        let ancestors: Vec<&Path> = path.ancestors().skip(1).collect();
        for ancestor in ancestors.into_iter().rev() {
            match self.nodes.get(ancestor) {
                None if ancestor.parent().is_none() => {}
                None => return Err(io::ErrorKind::NotFound.into()),
                Some(Node::Dir) => {}
                Some(Node::File) => return Err(io::ErrorKind::NotADirectory.into()),
                Some(Node::Denied) => return Err(io::ErrorKind::PermissionDenied.into()),
                Some(Node::Failing(kind)) => return Err((*kind).into()),
                Some(Node::Symlink(_)) => {
                    return Err(io::Error::other(
                        "SimulatedFs does not follow intermediate symlinks",
                    ));
                }
            }
        }

        match self.nodes.get(path) {
            Some(Node::Denied) => Err(io::ErrorKind::PermissionDenied.into()),
            Some(Node::Failing(kind)) => Err((*kind).into()),
            Some(node) => Ok(node),
            None if path.parent().is_none() => Ok(&Node::Dir),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }
}

impl FsProbe for SimulatedFs {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        self.inspected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());

        Ok(match self.lookup(path)? {
            Node::File => EntryKind::File,
            Node::Dir => EntryKind::Directory,
            Node::Symlink(_) => EntryKind::Symlink,
            Node::Denied | Node::Failing(_) => EntryKind::Other,
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self.lookup(path)? {
            Node::Symlink(target) => Ok(target.clone()),
            _ => Err(io::ErrorKind::InvalidInput.into()),
        }
    }
}

/// A scratch sandbox on the real filesystem.
///
/// Layout: `<temp>/sandbox` is the sandbox root and `<temp>/outside` is a
/// sibling directory for escape targets. Everything is removed on drop.
pub struct TestSandbox {
    temp: TempDir,
    pub sandbox: Sandbox,
}

impl TestSandbox {
    pub fn new() -> Self {
        Self::with_settings(JailbreakPolicy::Disallow, crate::DEFAULT_MAX_LINK_FOLLOWS)
    }

    pub fn with_settings(policy: JailbreakPolicy, max_link_follows: usize) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir(temp.path().join("sandbox")).expect("Failed to create sandbox dir");
        std::fs::create_dir(temp.path().join("outside")).expect("Failed to create outside dir");
        let sandbox = Sandbox::create(temp.path().join("sandbox"), policy, max_link_follows)
            .expect("Failed to create sandbox");
        Self { temp, sandbox }
    }

    /// Canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.sandbox.root_path()
    }

    /// Canonical path of the sibling `outside/` directory.
    pub fn outside(&self) -> PathBuf {
        dunce::canonicalize(self.temp.path().join("outside"))
            .expect("Failed to canonicalize outside dir")
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root().join(relative)
    }

    pub fn create_dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(&path).expect("Failed to create dir");
        path
    }

    pub fn create_file(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    pub fn create_outside_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.outside().join(name);
        std::fs::write(&path, contents).expect("Failed to write outside file");
        path
    }

    /// Create a symlink at `relative` (inside the sandbox) pointing at `target`
    /// exactly as given.
    #[cfg(unix)]
    pub fn symlink(&self, relative: impl AsRef<Path>, target: impl AsRef<Path>) -> PathBuf {
        let link = self.path(relative);
        std::os::unix::fs::symlink(target, &link).expect("Failed to create symlink");
        link
    }

    pub fn wrap(&self, path: impl AsRef<Path>) -> Result<BoxedPath> {
        self.sandbox.wrap(path)
    }
}

impl Default for TestSandbox {
    fn default() -> Self {
        Self::new()
    }
}
