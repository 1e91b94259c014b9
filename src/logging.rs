//! Diagnostic output setup.
//!
//! All diagnostics go through the `log` facade. A binary embedding this crate
//! calls [`init_logging`] once; `RUST_LOG` still overrides the level.

use env_logger::{Builder, Env, Target};

/// Installs an `env_logger` backend writing to stderr.
///
/// `verbose` raises the default level from `warn` to `info`, which is where
/// chain progress, dry-run echoes and profile audits are logged. Calling this
/// more than once is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };

    let result = Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_target(false)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
