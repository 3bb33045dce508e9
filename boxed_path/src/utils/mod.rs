//! Miscellaneous helpers shared by the library and the `boxed_path_check` binary.

pub mod logging;
