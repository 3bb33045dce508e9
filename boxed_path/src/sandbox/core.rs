use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{Result, SandboxError};
use super::lexical::{self, normalize_path_lexically};
use super::types::{CaseSensitivity, DEFAULT_MAX_LINK_FOLLOWS, JailbreakPolicy};
use crate::path::{BoxedPath, mask};
use crate::path_security;
use crate::probe::{FsProbe, OsProbe};

/// The immutable security context every [`BoxedPath`] is scoped to.
///
/// Cloning is cheap and clones share the same configuration.
#[derive(Clone)]
pub struct Sandbox {
    inner: Arc<Inner>,
}

struct Inner {
    root: PathBuf,
    policy: JailbreakPolicy,
    max_link_follows: usize,
    case_sensitivity: CaseSensitivity,
    probe: Arc<dyn FsProbe>,
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("root", &mask::ROOT_MARKER)
            .field("policy", &self.inner.policy)
            .field("max_link_follows", &self.inner.max_link_follows)
            .field("case_sensitivity", &self.inner.case_sensitivity)
            .finish()
    }
}

impl PartialEq for Sandbox {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.root == other.inner.root
                && self.inner.policy == other.inner.policy
                && self.inner.max_link_follows == other.inner.max_link_follows
                && self.inner.case_sensitivity == other.inner.case_sensitivity)
    }
}

impl Eq for Sandbox {}

/// Builder for [`Sandbox`] with non-default settings.
#[derive(Debug)]
pub struct SandboxBuilder {
    root: PathBuf,
    policy: JailbreakPolicy,
    max_link_follows: usize,
    case_sensitivity: CaseSensitivity,
    probe: Option<Arc<dyn FsProbe>>,
}

impl SandboxBuilder {
    pub fn policy(mut self, policy: JailbreakPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_link_follows(mut self, max_link_follows: usize) -> Self {
        self.max_link_follows = max_link_follows;
        self
    }

    pub fn case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    /// Inspect the filesystem through `probe` instead of the OS.
    ///
    /// The root is then taken in its lexical form: it is not canonicalized
    /// against the real filesystem.
    pub fn probe(mut self, probe: impl FsProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    pub fn build(self) -> Result<Sandbox> {
        let canonicalize = self.probe.is_none();
        let root = resolve_root(&self.root, canonicalize)?;

        if root.parent().is_none() {
            warn!(
                "Sandbox root is a filesystem root; every absolute path on this volume is inside it"
            );
        }

        debug!(
            policy = ?self.policy,
            max_link_follows = self.max_link_follows,
            case_sensitivity = ?self.case_sensitivity,
            "Sandbox configured"
        );

        Ok(Sandbox {
            inner: Arc::new(Inner {
                root,
                policy: self.policy,
                max_link_follows: self.max_link_follows,
                case_sensitivity: self.case_sensitivity,
                probe: self.probe.unwrap_or_else(|| Arc::new(OsProbe)),
            }),
        })
    }
}

impl Sandbox {
    /// Create a sandbox with the default policy and link limit.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::builder(root).build()
    }

    pub fn create(
        root: impl AsRef<Path>,
        policy: JailbreakPolicy,
        max_link_follows: usize,
    ) -> Result<Self> {
        Self::builder(root)
            .policy(policy)
            .max_link_follows(max_link_follows)
            .build()
    }

    pub fn builder(root: impl AsRef<Path>) -> SandboxBuilder {
        SandboxBuilder {
            root: root.as_ref().to_path_buf(),
            policy: JailbreakPolicy::default(),
            max_link_follows: DEFAULT_MAX_LINK_FOLLOWS,
            case_sensitivity: CaseSensitivity::default(),
            probe: None,
        }
    }

    /// The real location of the sandbox. Do not log this.
    pub fn root_path(&self) -> &Path {
        &self.inner.root
    }

    pub fn jailbreak_policy(&self) -> JailbreakPolicy {
        self.inner.policy
    }

    pub fn max_link_follows(&self) -> usize {
        self.inner.max_link_follows
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.inner.case_sensitivity
    }

    pub(crate) fn probe(&self) -> &dyn FsProbe {
        self.inner.probe.as_ref()
    }

    /// Lexical containment: is `path` the root or below it?
    pub fn contains(&self, path: &Path) -> bool {
        lexical::path_starts_with(path, &self.inner.root, self.inner.case_sensitivity)
    }

    /// Turn an untrusted string into a path scoped to this sandbox.
    ///
    /// Absolute input is validated now and fails here if it escapes. Anything
    /// else is kept as is and validated each time it is exported.
    pub fn wrap(&self, path: impl AsRef<Path>) -> Result<BoxedPath> {
        let path = path.as_ref();
        if path.is_absolute() {
            BoxedPath::absolute(self.clone(), path)
        } else {
            Ok(BoxedPath::relative(self.clone(), path))
        }
    }

    /// The sandbox directory itself.
    pub fn root(&self) -> BoxedPath {
        BoxedPath::root_of(self.clone())
    }

    /// Join `path` onto the root and validate the result immediately.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<BoxedPath> {
        BoxedPath::absolute(self.clone(), &self.inner.root.join(path))
    }

    /// Run the validation engine on an absolute candidate path.
    pub fn validate(&self, absolute: &Path) -> Result<PathBuf> {
        path_security::resolve_and_validate(self, absolute)
    }

    /// Redacted label for `path`, safe to log.
    pub fn mask(&self, path: &Path) -> String {
        mask::masked_label(&self.inner.root, self.inner.case_sensitivity, path)
    }
}

/// Make `root` absolute, drop `.`/`..` and trailing separators, then resolve
/// symlinks in it when it exists.
fn resolve_root(root: &Path, canonicalize: bool) -> Result<PathBuf> {
    let absolute = std::path::absolute(root).map_err(|source| SandboxError::InvalidRoot {
        path: root.to_path_buf(),
        source,
    })?;
    let normalized = normalize_path_lexically(&absolute);

    if !canonicalize {
        return Ok(normalized);
    }

    // `dunce` strips the verbatim `\\?\` prefix Windows canonicalization adds.
    match dunce::canonicalize(&normalized) {
        Ok(canonical) => Ok(canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Sandbox root does not exist yet; using its lexical form");
            Ok(normalized)
        }
        Err(source) => Err(SandboxError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        }),
    }
}
