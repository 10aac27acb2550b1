//! Logger installation for native and browser builds.

use crate::config::LogLevel;

/// Install the process-wide logger. Calling it again is a no-op.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LogLevel) {
    let installed = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .format_timestamp_millis()
        .try_init();
    if installed.is_ok() {
        log::info!("Logging initialised at {:?}", level);
    }
}

/// Install the process-wide logger. Calling it again is a no-op.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LogLevel) {
    if console_log::init_with_level(level.to_level()).is_ok() {
        log::info!("Logging initialised at {:?}", level);
    }
}
