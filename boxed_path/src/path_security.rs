//! Path security validation for sandboxed operations.
//!
//! This module decides whether an absolute candidate path stays within the
//! sandbox root. It has two stages:
//!
//! 1. **Lexical check** ([`shallow_validate`]): after `.`/`..` normalization the
//!    candidate must have the root as a component-wise prefix. This runs under
//!    every policy.
//! 2. **Physical check** ([`deep_resolve_and_validate`]): under
//!    [`JailbreakPolicy::Disallow`] the candidate is walked one segment at a time
//!    from the root. Every existing symlink is followed, every hop is charged
//!    against the sandbox's link budget and every intermediate and resolved path
//!    is re-checked against the root.
//!
//! ## Nonexistent components
//! A path to a file that does not exist yet is legitimate. As soon as a
//! component is reported missing the walk stops and the remaining segments are
//! appended literally: a missing component cannot be a symlink, and whatever is
//! created beneath it later inherits the validated prefix. Links created beneath
//! such a component after validation are not checked retroactively.
//!
//! ## Link targets
//! A resolved link target is not trusted as a string. Its segments are queued in
//! front of the remaining input and walked again from the root, so links inside
//! the target are inspected too. The result therefore contains no symlink above
//! its first missing component.
//!
//! ## Security
//! Anything that cannot be decided (permission denied while inspecting) is a
//! security violation. Results are never cached: each call inspects the
//! filesystem as it is now.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::probe::{EntryKind, FsProbe};
use crate::sandbox::lexical::{normalize_path_lexically, path_starts_with, relative_segments};
use crate::sandbox::{
    CaseSensitivity, JailbreakPolicy, Result, Sandbox, SandboxError, SecurityViolation,
};

/// Validate `absolute` against `sandbox` using the sandbox's jailbreak policy.
pub fn resolve_and_validate(sandbox: &Sandbox, absolute: &Path) -> Result<PathBuf> {
    let result = shallow_validate(sandbox.root_path(), sandbox.case_sensitivity(), absolute)
        .map_err(SandboxError::from)
        .and_then(|normalized| match sandbox.jailbreak_policy() {
            JailbreakPolicy::Disallow => deep_resolve_and_validate(sandbox, &normalized),
            JailbreakPolicy::UncheckedSymlinks => Ok(normalized),
        });

    match &result {
        Ok(resolved) => debug!(path = %sandbox.mask(resolved), "Path validated"),
        Err(SandboxError::Security(violation)) => warn!(
            path = %sandbox.mask(absolute),
            reason = ?violation.reason(),
            "Rejected path"
        ),
        Err(e) => debug!(path = %sandbox.mask(absolute), error = %e, "Path validation failed"),
    }
    result
}

/// Lexical containment check. Returns the normalized candidate.
pub fn shallow_validate(
    root: &Path,
    case: CaseSensitivity,
    absolute: &Path,
) -> std::result::Result<PathBuf, SecurityViolation> {
    let normalized = normalize_path_lexically(absolute);
    if normalized.is_absolute() && path_starts_with(&normalized, root, case) {
        Ok(normalized)
    } else {
        Err(SecurityViolation::LexicalEscape {
            path: absolute.to_path_buf(),
        })
    }
}

enum Inspection {
    Missing,
    Present,
    Symlink,
}

fn inspect(probe: &dyn FsProbe, path: &Path) -> Result<Inspection> {
    match probe.entry_kind(path) {
        Ok(EntryKind::Symlink) => Ok(Inspection::Symlink),
        Ok(_) => Ok(Inspection::Present),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(Inspection::Missing)
        }
        Err(e) => Err(classify_io_error(path, e)),
    }
}

fn classify_io_error(path: &Path, error: io::Error) -> SandboxError {
    if error.kind() == io::ErrorKind::PermissionDenied {
        SecurityViolation::AccessDenied {
            path: path.to_path_buf(),
        }
        .into()
    } else {
        SandboxError::filesystem(path, error)
    }
}

/// Physical, symlink-aware resolution of `absolute` under the sandbox root.
///
/// Returns the resolved path, which may differ from `absolute` when links were
/// followed.
pub fn deep_resolve_and_validate(sandbox: &Sandbox, absolute: &Path) -> Result<PathBuf> {
    let root = sandbox.root_path();
    let case = sandbox.case_sensitivity();
    let probe = sandbox.probe();
    let limit = sandbox.max_link_follows();
    let mut remaining_follows = limit;

    let normalized = normalize_path_lexically(absolute);
    let mut pending: VecDeque<OsString> = relative_segments(root, &normalized, case).into();
    let mut confirmed = root.to_path_buf();

    while let Some(segment) = pending.pop_front() {
        let candidate = normalize_path_lexically(&confirmed.join(&segment));
        if !path_starts_with(&candidate, root, case) {
            let violation = if candidate == absolute {
                SecurityViolation::Jailbreak { path: candidate }
            } else {
                SecurityViolation::RebuiltJailbreak {
                    path: candidate,
                    origin: absolute.to_path_buf(),
                }
            };
            return Err(violation.into());
        }

        match inspect(probe, &candidate)? {
            Inspection::Present => confirmed = candidate,
            Inspection::Missing => {
                debug!(
                    path = %sandbox.mask(&candidate),
                    skipped = pending.len(),
                    "Component does not exist; appending the rest unchecked"
                );
                return Ok(pending.into_iter().fold(candidate, |mut path, segment| {
                    path.push(segment);
                    path
                }));
            }
            Inspection::Symlink => {
                remaining_follows = remaining_follows.checked_sub(1).ok_or_else(|| {
                    SecurityViolation::DepthExceeded {
                        path: absolute.to_path_buf(),
                        limit,
                    }
                })?;

                let target = probe
                    .read_link(&candidate)
                    .map_err(|e| classify_io_error(&candidate, e))?;
                let resolved = normalize_path_lexically(&if target.is_absolute() {
                    target
                } else {
                    confirmed.join(target)
                });

                trace!(
                    link = %sandbox.mask(&candidate),
                    target = %sandbox.mask(&resolved),
                    remaining_follows,
                    "Following symlink"
                );

                if !path_starts_with(&resolved, root, case) {
                    return Err(SecurityViolation::SymlinkJailbreak {
                        target: resolved,
                        link: candidate,
                    }
                    .into());
                }

                for segment in relative_segments(root, &resolved, case).into_iter().rev() {
                    pending.push_front(segment);
                }
                confirmed = root.to_path_buf();
            }
        }
    }

    Ok(confirmed)
}
