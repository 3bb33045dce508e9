//! Redacted labels for logs and error reports.
//!
//! A label never contains the sandbox's real location: it is the root marker,
//! optionally followed by `...` and the last component of the path relative to
//! the root.

use std::path::Path;

use crate::sandbox::CaseSensitivity;
use crate::sandbox::lexical::{normalize_path_lexically, path_eq, relative_path};

pub const ROOT_MARKER: &str = "[SANDBOX_ROOT]";
const ELLIPSIS: &str = "...";

/// Build the label for `raw`, which may be absolute or relative to `root`.
pub fn masked_label(root: &Path, case: CaseSensitivity, raw: &Path) -> String {
    if path_eq(raw, root, case) {
        return ROOT_MARKER.to_string();
    }

    let absolute = normalize_path_lexically(&root.join(raw));
    let relative = relative_path(root, &absolute, case);

    // `.` and `..` have no file name; show the bare component instead.
    let last = relative
        .components()
        .next_back()
        .map_or_else(|| ".".to_string(), |c| c.as_os_str().to_string_lossy().into_owned());

    format!("{ROOT_MARKER}{ELLIPSIS}{last}")
}
