//! Log facade setup.
//!
//! The runtime logs through the `log` macros. Host programs that link the
//! static library call `flyux_runtime_init`, which installs `env_logger`
//! filtered by `FLYUX_LOG` (same syntax as `RUST_LOG`).

use env_logger::{Builder, Env, Target};

pub const LOG_ENV: &str = "FLYUX_LOG";
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the stderr logger. Safe to call more than once; later calls are
/// ignored, as are calls after the host installed its own logger.
pub fn init() {
    let env = Env::default().filter_or(LOG_ENV, DEFAULT_FILTER);
    let installed = Builder::from_env(env)
        .target(Target::Stderr)
        .format_timestamp(None)
        .try_init()
        .is_ok();
    if installed {
        log::debug!("flyux runtime {} logging initialised", crate::VERSION);
    }
}
