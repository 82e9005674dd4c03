//! Opt-in diagnostic channel.
//!
//! Retry queue and filesystem facade events are emitted through `tracing` at
//! debug level under the `gracefs` target, but only when the `GRACEFS_DEBUG`
//! environment variable is set to something other than an empty string or
//! `0`. The variable is read once per process.

use std::sync::OnceLock;

/// Environment switch that turns the diagnostic channel on.
pub const DEBUG_ENV: &str = "GRACEFS_DEBUG";

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether diagnostic events are emitted.
pub fn enabled() -> bool {
    *ENABLED.get_or_init(|| switch_is_on(std::env::var_os(DEBUG_ENV).as_deref()))
}

fn switch_is_on(value: Option<&std::ffi::OsStr>) -> bool {
    match value {
        Some(v) => !v.is_empty() && v != "0",
        None => false,
    }
}

/// Emit one diagnostic event when the channel is on.
macro_rules! event {
    ($event:literal, $($field:tt)*) => {
        if $crate::trace::enabled() {
            ::tracing::debug!(target: "gracefs", event = $event, $($field)*);
        }
    };
}

pub(crate) use event;
