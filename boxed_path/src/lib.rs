//! # Boxed Path
//!
//! Confine every filesystem path a program touches to one directory, the
//! *sandbox root*, even when the paths come from untrusted input and the tree
//! contains symbolic links.
//!
//! ## Core Concepts
//!
//! - **`Sandbox`**: immutable configuration (root, jailbreak policy, symlink
//!   hop limit, case sensitivity). Build it once and share it; clones are cheap.
//! - **`BoxedPath`**: a path owned by a sandbox, either *Absolute* (validated
//!   when created) or *Relative* (validated every time it is exported).
//! - **Validation engine** (`path_security`): a lexical check that normalizes
//!   `.`/`..` and compares components against the root, followed, under
//!   [`JailbreakPolicy::Disallow`], by a component-by-component walk that
//!   resolves every symlink and rejects any that leave the root.
//!
//! ## Usage
//!
//! ```no_run
//! use boxed_path::{Sandbox, fs};
//!
//! # fn main() -> boxed_path::Result<()> {
//! let sandbox = Sandbox::new("/srv/uploads")?;
//! let report = sandbox.wrap("reports/q3.txt")?;
//! let text = fs::read_to_string(&report)?;
//! # let _ = text;
//!
//! assert!(sandbox.wrap("/etc/passwd").is_err());
//! # Ok(())
//! # }
//! ```
//!
//! The OS path for I/O is only available from [`BoxedPath::export`]; the
//! [`fs`] and `async_fs` wrappers call it immediately before each operation.
//!
//! ## Modules
//!
//! - **`sandbox`**: `Sandbox`, its builder, error types and lexical helpers.
//! - **`path`**: `BoxedPath` and the masked labels used by `Display`.
//! - **`path_security`**: the validation engine.
//! - **`probe`**: the `FsProbe` seam between the engine and the OS.
//! - **`config`**: TOML sandbox descriptions.
//! - **`fs`** / **`async_fs`**: I/O on `BoxedPath` values.
//! - **`utils`**: logging setup.

pub mod config;
pub mod fs;
pub mod path;
pub mod path_security;
pub mod probe;
pub mod sandbox;
pub mod utils;

#[cfg(feature = "tokio")]
pub mod async_fs;

// Test utilities
pub mod test_utils;

pub use config::SandboxConfig;
pub use path::{BoxedPath, PathKind};
pub use probe::{EntryKind, FsProbe, OsProbe};
pub use sandbox::{
    CaseSensitivity, DEFAULT_MAX_LINK_FOLLOWS, JailbreakPolicy, ReasonCode, Result, Sandbox,
    SandboxBuilder, SandboxError, SecurityViolation,
};
