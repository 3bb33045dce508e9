//! Blocking filesystem operations on [`BoxedPath`] values.
//!
//! Each function exports its path(s) immediately before the OS call, so a
//! *Relative* value is validated against the filesystem as it is at that
//! moment. The window between validation and the call itself is not closed.
//!
//! Filesystem errors carry the caller's raw path, not the exported one.

use std::fs::{File, Metadata};
use std::io;
use std::path::PathBuf;

use tracing::trace;

use crate::path::BoxedPath;
use crate::sandbox::{Result, SandboxError};

fn export(path: &BoxedPath, op: &'static str) -> Result<PathBuf> {
    let exported = path.export()?;
    trace!(op, path = %path, "Exported sandboxed path");
    Ok(exported)
}

fn io_error(path: &BoxedPath) -> impl FnOnce(io::Error) -> SandboxError + '_ {
    move |source| SandboxError::filesystem(path.raw_unchecked(), source)
}

/// Whether the path exists. Broken symlinks inside the sandbox report `false`.
pub fn exists(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "exists")?;
    std::fs::exists(&exported).map_err(io_error(path))
}

pub fn is_file(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "is_file")?;
    match std::fs::metadata(&exported) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

pub fn is_dir(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "is_dir")?;
    match std::fs::metadata(&exported) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

pub fn read(path: &BoxedPath) -> Result<Vec<u8>> {
    let exported = export(path, "read")?;
    std::fs::read(&exported).map_err(io_error(path))
}

pub fn read_to_string(path: &BoxedPath) -> Result<String> {
    let exported = export(path, "read_to_string")?;
    std::fs::read_to_string(&exported).map_err(io_error(path))
}

pub fn write(path: &BoxedPath, contents: impl AsRef<[u8]>) -> Result<()> {
    let exported = export(path, "write")?;
    std::fs::write(&exported, contents).map_err(io_error(path))
}

/// Copy `from` to `to`, both inside their sandboxes. Returns the bytes copied.
pub fn copy(from: &BoxedPath, to: &BoxedPath) -> Result<u64> {
    let source = export(from, "copy")?;
    let destination = export(to, "copy")?;
    std::fs::copy(&source, &destination).map_err(|e| {
        // Blame the source only when it cannot be stat'ed; otherwise the destination failed.
        let failed = if std::fs::metadata(&source).is_err() { from } else { to };
        io_error(failed)(e)
    })
}

pub fn remove_file(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_file")?;
    std::fs::remove_file(&exported).map_err(io_error(path))
}

pub fn create_dir_all(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "create_dir_all")?;
    std::fs::create_dir_all(&exported).map_err(io_error(path))
}

pub fn remove_dir(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_dir")?;
    std::fs::remove_dir(&exported).map_err(io_error(path))
}

/// Recursively remove a directory.
///
/// Symlinks found inside are removed, not followed, so their targets survive.
pub fn remove_dir_all(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_dir_all")?;
    std::fs::remove_dir_all(&exported).map_err(io_error(path))
}

pub fn open(path: &BoxedPath) -> Result<File> {
    let exported = export(path, "open")?;
    File::open(&exported).map_err(io_error(path))
}

pub fn create(path: &BoxedPath) -> Result<File> {
    let exported = export(path, "create")?;
    File::create(&exported).map_err(io_error(path))
}

/// Metadata of the final target (symlinks are followed, after validation).
pub fn metadata(path: &BoxedPath) -> Result<Metadata> {
    let exported = export(path, "metadata")?;
    std::fs::metadata(&exported).map_err(io_error(path))
}

/// List a directory.
///
/// Every entry comes back as a freshly validated *Absolute* value. The first
/// entry that fails validation (for instance a symlink pointing outside the
/// sandbox) aborts the listing with that error.
pub fn read_dir(path: &BoxedPath) -> Result<Vec<BoxedPath>> {
    let exported = export(path, "read_dir")?;
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(&exported).map_err(io_error(path))? {
        let entry = entry.map_err(io_error(path))?;
        entries.push(path.sandbox().resolve(entry.path())?);
    }
    entries.sort_by(|a, b| a.raw_unchecked().cmp(b.raw_unchecked()));
    Ok(entries)
}
