use serde::{Deserialize, Serialize};
use std::ffi::OsStr;

/// Default bound on symlink hops while resolving a single path.
pub const DEFAULT_MAX_LINK_FOLLOWS: usize = 5;

/// How symbolic links inside the sandbox are treated during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JailbreakPolicy {
    /// Resolve every component physically and reject any link that leaves the root.
    #[default]
    Disallow,
    /// Lexical check only. Links pointing outside the root are accepted.
    UncheckedSymlinks,
}

/// Case handling for the root-prefix comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// The usual behavior of the default filesystem on the build target.
    pub const fn platform_default() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    /// Compare two path components.
    ///
    /// Components that are not valid UTF-8 are only ever compared byte for byte.
    pub fn eq_component(self, a: &OsStr, b: &OsStr) -> bool {
        match self {
            Self::Sensitive => a == b,
            Self::Insensitive => match (a.to_str(), b.to_str()) {
                (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => a == b,
            },
        }
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::platform_default()
    }
}
