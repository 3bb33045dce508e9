use std::path::{Path, PathBuf};

/// Coarse classification of a [`SecurityViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    LexicalEscape,
    Jailbreak,
    DepthExceeded,
    AccessDenied,
}

/// A path was refused because it is, or might be, outside the sandbox.
///
/// These are never downgraded to "not found" and never corrected silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityViolation {
    #[error("Path '{path:?}' is outside the sandbox (lexical check failed)")]
    LexicalEscape { path: PathBuf },

    #[error("Path '{path:?}' resolves outside the sandbox (jailbreak detected)")]
    Jailbreak { path: PathBuf },

    #[error(
        "Path '{path:?}' (derived from rebuilding '{origin:?}') resolves outside the sandbox (jailbreak detected)"
    )]
    RebuiltJailbreak { path: PathBuf, origin: PathBuf },

    #[error(
        "Path '{target:?}' (derived from following symlink '{link:?}') resolves outside the sandbox (jailbreak detected)"
    )]
    SymlinkJailbreak { target: PathBuf, link: PathBuf },

    #[error("Symlink depth limit exceeded: aborted traversal of '{path:?}' after {limit} links")]
    DepthExceeded { path: PathBuf, limit: usize },

    #[error("Access denied while inspecting '{path:?}'")]
    AccessDenied { path: PathBuf },
}

impl SecurityViolation {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::LexicalEscape { .. } => ReasonCode::LexicalEscape,
            Self::Jailbreak { .. } | Self::RebuiltJailbreak { .. } | Self::SymlinkJailbreak { .. } => {
                ReasonCode::Jailbreak
            }
            Self::DepthExceeded { .. } => ReasonCode::DepthExceeded,
            Self::AccessDenied { .. } => ReasonCode::AccessDenied,
        }
    }

    /// The offending path fragment.
    pub fn path(&self) -> &Path {
        match self {
            Self::LexicalEscape { path }
            | Self::Jailbreak { path }
            | Self::RebuiltJailbreak { path, .. }
            | Self::DepthExceeded { path, .. }
            | Self::AccessDenied { path } => path,
            Self::SymlinkJailbreak { target, .. } => target,
        }
    }
}

/// Errors produced by sandbox configuration, validation and the I/O wrappers.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error(transparent)]
    Security(#[from] SecurityViolation),

    #[error("Filesystem error on '{path:?}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve sandbox root '{path:?}': {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read sandbox configuration '{path:?}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sandbox configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl SandboxError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a containment failure rather than an ordinary I/O error.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::Security(_))
    }

    pub fn security_violation(&self) -> Option<&SecurityViolation> {
        match self {
            Self::Security(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        self.security_violation().map(SecurityViolation::reason)
    }
}

pub type Result<T, E = SandboxError> = std::result::Result<T, E>;
