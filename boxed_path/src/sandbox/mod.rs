//! # Sandbox Configuration
//!
//! A [`Sandbox`] fixes the directory that every path derived from it must stay
//! inside, together with the rules used to check that:
//!
//! - **Jailbreak policy**: `Disallow` (default) resolves every component
//!   physically and follows symlinks; `UncheckedSymlinks` trusts the lexical
//!   check alone.
//! - **Link limit**: the total number of symlink hops allowed while resolving a
//!   single path (default 5).
//! - **Case sensitivity** of the root-prefix comparison, defaulting to the
//!   usual behavior of the target OS.
//!
//! The sandbox is the factory for [`crate::BoxedPath`] values and is passed
//! explicitly to each of them. There is no global sandbox.

pub(crate) mod core;
mod error;
pub mod lexical;
mod types;

pub use self::core::{Sandbox, SandboxBuilder};
pub use error::{ReasonCode, Result, SandboxError, SecurityViolation};
pub use lexical::normalize_path_lexically;
pub use types::{CaseSensitivity, DEFAULT_MAX_LINK_FOLLOWS, JailbreakPolicy};
