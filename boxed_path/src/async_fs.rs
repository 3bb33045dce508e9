//! Async counterparts of [`crate::fs`], built on `tokio::fs`.
//!
//! Validation touches the filesystem synchronously, so each export runs on
//! tokio's blocking pool before the async I/O starts. Requires a tokio runtime.

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;

use tokio::fs::File;
use tokio::task::spawn_blocking;
use tracing::trace;

use crate::path::BoxedPath;
use crate::sandbox::{Result, SandboxError};

async fn blocking<T, F>(path: &BoxedPath, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(BoxedPath) -> Result<T> + Send + 'static,
{
    let owned = path.clone();
    spawn_blocking(move || f(owned))
        .await
        .map_err(|e| SandboxError::filesystem(path.raw_unchecked(), io::Error::other(e)))?
}

async fn export(path: &BoxedPath, op: &'static str) -> Result<PathBuf> {
    let exported = blocking(path, |p| p.export()).await?;
    trace!(op, path = %path, "Exported sandboxed path");
    Ok(exported)
}

fn io_error(path: &BoxedPath) -> impl FnOnce(io::Error) -> SandboxError + '_ {
    move |source| SandboxError::filesystem(path.raw_unchecked(), source)
}

pub async fn exists(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "exists").await?;
    tokio::fs::try_exists(&exported).await.map_err(io_error(path))
}

pub async fn is_file(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "is_file").await?;
    match tokio::fs::metadata(&exported).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

pub async fn is_dir(path: &BoxedPath) -> Result<bool> {
    let exported = export(path, "is_dir").await?;
    match tokio::fs::metadata(&exported).await {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

pub async fn read(path: &BoxedPath) -> Result<Vec<u8>> {
    let exported = export(path, "read").await?;
    tokio::fs::read(&exported).await.map_err(io_error(path))
}

pub async fn read_to_string(path: &BoxedPath) -> Result<String> {
    let exported = export(path, "read_to_string").await?;
    tokio::fs::read_to_string(&exported)
        .await
        .map_err(io_error(path))
}

pub async fn write(path: &BoxedPath, contents: impl AsRef<[u8]>) -> Result<()> {
    let exported = export(path, "write").await?;
    tokio::fs::write(&exported, contents)
        .await
        .map_err(io_error(path))
}

pub async fn copy(from: &BoxedPath, to: &BoxedPath) -> Result<u64> {
    let source = export(from, "copy").await?;
    let destination = export(to, "copy").await?;
    match tokio::fs::copy(&source, &destination).await {
        Ok(bytes) => Ok(bytes),
        // Blame the source only when it cannot be stat'ed; otherwise the destination failed.
        Err(e) => match tokio::fs::metadata(&source).await {
            Ok(_) => Err(io_error(to)(e)),
            Err(_) => Err(io_error(from)(e)),
        },
    }
}

pub async fn remove_file(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_file").await?;
    tokio::fs::remove_file(&exported)
        .await
        .map_err(io_error(path))
}

pub async fn create_dir_all(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "create_dir_all").await?;
    tokio::fs::create_dir_all(&exported)
        .await
        .map_err(io_error(path))
}

pub async fn remove_dir(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_dir").await?;
    tokio::fs::remove_dir(&exported)
        .await
        .map_err(io_error(path))
}

pub async fn remove_dir_all(path: &BoxedPath) -> Result<()> {
    let exported = export(path, "remove_dir_all").await?;
    tokio::fs::remove_dir_all(&exported)
        .await
        .map_err(io_error(path))
}

pub async fn open(path: &BoxedPath) -> Result<File> {
    let exported = export(path, "open").await?;
    File::open(&exported).await.map_err(io_error(path))
}

pub async fn create(path: &BoxedPath) -> Result<File> {
    let exported = export(path, "create").await?;
    File::create(&exported).await.map_err(io_error(path))
}

pub async fn metadata(path: &BoxedPath) -> Result<Metadata> {
    let exported = export(path, "metadata").await?;
    tokio::fs::metadata(&exported)
        .await
        .map_err(io_error(path))
}

/// List a directory; see [`crate::fs::read_dir`]. Listing and per-entry
/// validation both run on the blocking pool.
pub async fn read_dir(path: &BoxedPath) -> Result<Vec<BoxedPath>> {
    blocking(path, |p| crate::fs::read_dir(&p)).await
}
