//! # Sandbox Configuration Files
//!
//! A sandbox can be described in TOML instead of being built in code:
//!
//! ```toml
//! root = "/srv/uploads"
//! jailbreak_policy = "disallow"      # or "unchecked_symlinks"
//! max_link_follows = 5
//! case_sensitivity = "sensitive"     # or "insensitive"
//! ```
//!
//! Only `root` is required. Omitted settings take the same defaults as
//! [`Sandbox::new`]. Unknown keys are rejected so that a typo cannot silently
//! weaken a policy.
//!
//! - **`SandboxConfig::from_toml_str`** parses a string.
//! - **`SandboxConfig::load_from_file`** reads a file; a relative `root` is taken
//!   relative to the directory containing that file.
//! - **`SandboxConfig::build`** turns the description into a [`Sandbox`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sandbox::{
    CaseSensitivity, DEFAULT_MAX_LINK_FOLLOWS, JailbreakPolicy, Result, Sandbox, SandboxError,
};

/// Serializable description of a [`Sandbox`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Directory every sandboxed path must stay under.
    pub root: PathBuf,
    #[serde(default)]
    pub jailbreak_policy: JailbreakPolicy,
    /// Total symlink hops allowed while resolving a single path.
    #[serde(default = "default_max_link_follows")]
    pub max_link_follows: usize,
    /// Platform default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitivity: Option<CaseSensitivity>,
}

fn default_max_link_follows() -> usize {
    DEFAULT_MAX_LINK_FOLLOWS
}

impl SandboxConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jailbreak_policy: JailbreakPolicy::default(),
            max_link_follows: DEFAULT_MAX_LINK_FOLLOWS,
            case_sensitivity: None,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a TOML file.
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(config_path).map_err(|source| SandboxError::ConfigRead {
                path: config_path.to_path_buf(),
                source,
            })?;
        let mut config = Self::from_toml_str(&contents)?;

        if config.root.is_relative()
            && let Some(base) = config_path.parent()
        {
            config.root = base.join(&config.root);
        }

        debug!(
            policy = ?config.jailbreak_policy,
            max_link_follows = config.max_link_follows,
            "Loaded sandbox configuration"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn build(&self) -> Result<Sandbox> {
        let mut builder = Sandbox::builder(&self.root)
            .policy(self.jailbreak_policy)
            .max_link_follows(self.max_link_follows);
        if let Some(case_sensitivity) = self.case_sensitivity {
            builder = builder.case_sensitivity(case_sensitivity);
        }
        builder.build()
    }
}
