//! # Logging Initialization
//!
//! A single entry point, [`init_logging`], installs the global `tracing`
//! subscriber. It is guarded by a `std::sync::Once`, so later calls are no-ops.
//!
//! ## Logging Configuration
//!
//! 1.  **Environment Filter (`EnvFilter`)**: `RUST_LOG` wins when set. Otherwise
//!     other crates log at `warn` and the `boxed_path` crates at the requested level.
//!
//! 2.  **Stderr Logging (Default)**: With no log directory, events go to `stderr`
//!     with ANSI colors.
//!
//! 3.  **File Logging (Opt-in)**: With a log directory, events go to a daily
//!     rolling `boxed_path.log` through a non-blocking `tracing_appender` writer,
//!     without colors.
//!
//! Rejections are logged at `warn` using masked labels only; the sandbox root
//! never appears in log output produced by this crate.

use std::io::{self, stderr};
use std::path::Path;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

const LOG_FILE_NAME: &str = "boxed_path.log";

/// Initialize verbose logging for tests.
pub fn init_test_logging() {
    // Tests may race to install a subscriber; the first one wins.
    let _ = init_logging("trace", None);
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if `log_dir` is given but cannot be created or written to.
pub fn init_logging(log_level: &str, log_dir: Option<&Path>) -> io::Result<()> {
    if let Some(dir) = log_dir {
        check_write_permission(dir)?;
    }

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "warn,boxed_path={log_level},boxed_path_check={log_level}"
            ))
        });

        if let Some(dir) = log_dir {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(layer().with_writer(non_blocking).with_ansi(false))
                .try_init();

            // Leaked so buffered events are flushed for the life of the process.
            Box::leak(Box::new(guard));
            return;
        }

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer().with_writer(stderr).with_ansi(true))
            .try_init();
    });

    Ok(())
}

/// Create `dir` if needed and prove a file can be written there.
///
/// `tracing_appender::rolling::daily` panics on permission errors, so this is
/// checked up front.
fn check_write_permission(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe_file = dir.join(".boxed_path_log_test");
    std::fs::write(&probe_file, "test")?;
    let _ = std::fs::remove_file(&probe_file);
    Ok(())
}
