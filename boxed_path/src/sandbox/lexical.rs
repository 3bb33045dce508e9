//! Purely lexical path helpers. Nothing here touches the filesystem.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use super::types::CaseSensitivity;

/// Normalize a path lexically (without filesystem access).
///
/// `.` components are dropped and `..` removes the preceding normal component.
/// A `..` directly below the root is discarded, as the OS does. Leading `..`
/// components of a relative path are preserved.
pub fn normalize_path_lexically(path: &Path) -> PathBuf {
    let mut stack: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => stack.push(component),
            },
            c => stack.push(c),
        }
    }

    stack.iter().collect()
}

fn components_eq(a: Component<'_>, b: Component<'_>, case: CaseSensitivity) -> bool {
    match (a, b) {
        (Component::Normal(a), Component::Normal(b)) => case.eq_component(a, b),
        (Component::Prefix(a), Component::Prefix(b)) => {
            case.eq_component(a.as_os_str(), b.as_os_str())
        }
        (a, b) => a == b,
    }
}

/// Component-wise prefix test: `/sandbox2` does not start with `/sandbox`.
pub fn path_starts_with(path: &Path, root: &Path, case: CaseSensitivity) -> bool {
    let mut path_components = path.components();
    for root_component in root.components() {
        match path_components.next() {
            Some(c) if components_eq(c, root_component, case) => {}
            _ => return false,
        }
    }
    true
}

/// Component-wise equality honoring `case`.
pub fn path_eq(a: &Path, b: &Path, case: CaseSensitivity) -> bool {
    a.components().count() == b.components().count() && path_starts_with(a, b, case)
}

/// Segments leading from `base` to `path`, both lexically normalized absolute paths.
///
/// When `path` is not below `base` the result starts with one `..` per
/// unmatched component of `base`, so an escape stays visible to the caller.
pub fn relative_segments(base: &Path, path: &Path, case: CaseSensitivity) -> Vec<OsString> {
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = path.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| components_eq(**a, **b, case))
        .count();

    let mut segments: Vec<OsString> = std::iter::repeat_n(OsString::from(".."), base.len() - common)
        .collect();
    segments.extend(target[common..].iter().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_os_string()),
        Component::ParentDir => Some(OsString::from("..")),
        _ => None,
    }));
    segments
}

/// Like [`relative_segments`] but joined into a path; `.` when both are equal.
pub fn relative_path(base: &Path, path: &Path, case: CaseSensitivity) -> PathBuf {
    let segments = relative_segments(base, path, case);
    if segments.is_empty() {
        PathBuf::from(".")
    } else {
        segments.iter().collect()
    }
}
