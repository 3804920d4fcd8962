//! Environment-driven defaults.

use std::env;

/// Runtime defaults read from the environment once at construction.
///
/// - `DRIFT_TUI_HARDWARE_CURSOR=0` keeps the hardware cursor hidden even
///   when a focused input emits a cursor marker.
/// - `DRIFT_TUI_CLEAR_ON_SHRINK=0` leaves orphaned rows on screen when
///   content shrinks (fewer redraws on slow links).
/// - `DRIFT_TUI_WRITE_LOG=<path>` tees every terminal write to a file.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub hardware_cursor: bool,
    pub clear_on_shrink: bool,
    pub write_log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            hardware_cursor: env_flag_default_on("DRIFT_TUI_HARDWARE_CURSOR"),
            clear_on_shrink: env_flag_default_on("DRIFT_TUI_CLEAR_ON_SHRINK"),
            write_log: env_string_opt("DRIFT_TUI_WRITE_LOG"),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_flag_default_on(key: &str) -> bool {
    env::var(key).map(|value| value != "0").unwrap_or(true)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
