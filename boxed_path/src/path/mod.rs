//! # Sandboxed Path Values
//!
//! [`BoxedPath`] is a path that belongs to a [`Sandbox`]. It comes in two
//! variants:
//!
//! - **Absolute**: validated once, when the value is created (ingress). Every
//!   transformation that keeps it absolute validates the new value immediately,
//!   so a security failure surfaces at the call that caused it.
//! - **Relative**: stored exactly as given and validated against the current
//!   filesystem each time it is exported (egress).
//!
//! Path algebra (`combine`, `parent`, extension edits) works on the raw path and
//! never exposes it. The only sanctioned way to obtain an OS path for I/O is
//! [`BoxedPath::export`], called right before the I/O happens.
//!
//! `Display` and `Debug` show a masked label (see [`mask`]), never the real
//! location of the sandbox.

pub mod mask;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::sandbox::{Result, Sandbox};

/// Which variant a [`BoxedPath`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Absolute,
    Relative,
}

#[derive(Clone, PartialEq, Eq)]
enum Repr {
    /// Holds the path returned by the validation engine.
    Absolute(PathBuf),
    /// Holds the caller's path, unresolved.
    Relative(PathBuf),
}

/// A path scoped to a [`Sandbox`].
#[derive(Clone, PartialEq, Eq)]
pub struct BoxedPath {
    sandbox: Sandbox,
    repr: Repr,
}

impl BoxedPath {
    pub(crate) fn absolute(sandbox: Sandbox, path: &Path) -> Result<Self> {
        let validated = sandbox.validate(path)?;
        Ok(Self {
            sandbox,
            repr: Repr::Absolute(validated),
        })
    }

    pub(crate) fn relative(sandbox: Sandbox, path: &Path) -> Self {
        Self {
            sandbox,
            repr: Repr::Relative(path.to_path_buf()),
        }
    }

    pub(crate) fn root_of(sandbox: Sandbox) -> Self {
        let root = sandbox.root_path().to_path_buf();
        Self {
            sandbox,
            repr: Repr::Absolute(root),
        }
    }

    fn raw(&self) -> &Path {
        match &self.repr {
            Repr::Absolute(path) | Repr::Relative(path) => path,
        }
    }

    /// New value of the same variant; absolute values are validated again.
    fn with_raw(&self, raw: PathBuf) -> Result<Self> {
        match self.repr {
            Repr::Absolute(_) => Self::absolute(self.sandbox.clone(), &raw),
            Repr::Relative(_) => Ok(Self::relative(self.sandbox.clone(), &raw)),
        }
    }

    pub fn kind(&self) -> PathKind {
        match self.repr {
            Repr::Absolute(_) => PathKind::Absolute,
            Repr::Relative(_) => PathKind::Relative,
        }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Join `segment` onto this path (OS join semantics: an absolute segment
    /// replaces the path).
    pub fn combine(&self, segment: impl AsRef<Path>) -> Result<Self> {
        self.with_raw(self.raw().join(segment))
    }

    /// Join several segments at once. Absolute values are validated once, on
    /// the final result.
    pub fn combine_all<I, P>(&self, segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut raw = self.raw().to_path_buf();
        for segment in segments {
            raw.push(segment);
        }
        self.with_raw(raw)
    }

    /// The parent path, or `None` when the raw path has no distinct parent.
    ///
    /// The parent of an absolute value is validated, so asking for the parent
    /// of the sandbox root is a security violation, not `None`.
    pub fn parent(&self) -> Result<Option<Self>> {
        let raw = self.raw();
        match raw.parent() {
            Some(parent) if parent != raw => self.with_raw(parent.to_path_buf()).map(Some),
            _ => Ok(None),
        }
    }

    /// Replace the extension. `None` or `Some("")` removes it; a leading dot is
    /// optional.
    pub fn change_extension(&self, extension: Option<&str>) -> Result<Self> {
        let extension = extension.map_or("", |e| e.strip_prefix('.').unwrap_or(e));
        let mut raw = self.raw().to_path_buf();
        raw.set_extension(extension);
        self.with_raw(raw)
    }

    /// Final component, empty when there is none.
    pub fn file_name(&self) -> String {
        self.raw()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_name_without_extension(&self) -> String {
        self.raw()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension without the leading dot, empty when there is none.
    pub fn extension(&self) -> String {
        self.raw()
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the raw path is rooted. This is about the path string, not the
    /// variant: see [`BoxedPath::kind`].
    pub fn is_absolute(&self) -> bool {
        self.raw().is_absolute()
    }

    /// Resolve against the sandbox root into a validated absolute value.
    pub fn full_path(&self) -> Result<Self> {
        Self::absolute(
            self.sandbox.clone(),
            &self.sandbox.root_path().join(self.raw()),
        )
    }

    /// The OS path to use for I/O.
    ///
    /// Absolute values return the path validated at construction. Relative
    /// values are joined onto the root and validated against the filesystem as
    /// it is now, on every call.
    pub fn export(&self) -> Result<PathBuf> {
        match &self.repr {
            Repr::Absolute(validated) => Ok(validated.clone()),
            Repr::Relative(raw) => self.sandbox.validate(&self.sandbox.root_path().join(raw)),
        }
    }

    /// Validate against the current filesystem regardless of variant.
    ///
    /// Useful for long-lived absolute values whose surroundings may have
    /// changed since they were created.
    pub fn revalidate(&self) -> Result<PathBuf> {
        self.sandbox.validate(&self.sandbox.root_path().join(self.raw()))
    }

    /// The raw path, unchecked. Diagnostics only: never use it for I/O.
    pub fn raw_unchecked(&self) -> &Path {
        self.raw()
    }

    /// Redacted label, safe for logs.
    pub fn masked(&self) -> String {
        self.sandbox.mask(self.raw())
    }
}

impl fmt::Display for BoxedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for BoxedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(match self.repr {
            Repr::Absolute(_) => "BoxedPath::Absolute",
            Repr::Relative(_) => "BoxedPath::Relative",
        })
        .field(&self.masked())
        .finish()
    }
}
