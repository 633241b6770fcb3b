//! Structured logging with box-drawing output.
//!
//! All scheduler output goes through the macros in this module so that the
//! CLI, the dispatcher and the engine share one visual style:
//!
//! ```text
//! ┏ sunsched v0.4.0 ━━╸
//! ┃
//! ┣ Loading scheduler [place-1]
//! ┃   Timezone: America/Chicago
//! ┣[DEBUG] Next fire for [weekday]: 2026-10-19 07:30:00 CDT
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - **`log_block_start!`** opens a new conceptual block (prepends an empty `┃`).
//! - **`log_decorated!`** continues a block with `┣ message`.
//! - **`log_indented!`** prints nested detail as `┃   message`.
//! - **`log_pipe!`** inserts a single empty `┃` line for spacing.
//! - **`log_version!`** / **`log_end!`** frame a whole run.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`** carry a `[LEVEL]`
//!   prefix. `log_debug!` is silent unless debug output was switched on with
//!   [`Log::set_debug`].
//!
//! Logging can be disabled entirely with [`Log::set_enabled`], which the test
//! suites do to keep their output readable.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Optional prefix (e.g. simulated wall clock) prepended to every line
static LINE_PREFIX: Mutex<Option<String>> = Mutex::new(None);

/// Runtime switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all log output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Set a prefix printed before every line, such as `[07:30:00] `.
    /// Passing `None` removes it.
    pub fn set_line_prefix(prefix: Option<String>) {
        if let Ok(mut guard) = LINE_PREFIX.lock() {
            *guard = prefix;
        }
    }

    /// Current line prefix, empty when none is set. Public for macro access.
    pub fn line_prefix() -> String {
        LINE_PREFIX
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Write already formatted text to stdout. Public for macro access.
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Shared expansion for every logging macro: `$lead` is the line decoration
/// placed between the prefix and the message.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($lead:expr, $($arg:tt)+) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::line_prefix();
            let message = format!($($arg)+);
            $crate::logger::write_output(&format!("{prefix}{}{message}\n", $lead));
        }
    }};
}

/// Log a decorated message as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::__log_line!("┣ ", $($arg)+)
    };
}

/// Log an indented detail line within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::__log_line!("┃   ", $($arg)+)
    };
}

/// Log an empty pipe for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_line!("┃", "")
    };
}

/// Start a new block of related output.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {{
        $crate::log_pipe!();
        $crate::__log_line!("┣ ", $($arg)+)
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!("┏ ", "sunsched v{} ━━╸", env!("CARGO_PKG_VERSION"))
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_line!("╹", "")
    };
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__log_line!("┣[\x1b[32mINFO\x1b[0m] ", $($arg)+)
    };
}

/// Log a warning message in yellow.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::__log_line!("┣[\x1b[33mWARNING\x1b[0m] ", $($arg)+)
    };
}

/// Log an error message in red.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__log_line!("┣[\x1b[31mERROR\x1b[0m] ", $($arg)+)
    };
}

/// Log a debug message, only when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        if $crate::logger::Log::is_debug() {
            $crate::__log_line!("┣[\x1b[36mDEBUG\x1b[0m] ", $($arg)+)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_enable_toggle() {
        Log::set_enabled(false);
        assert!(!Log::is_enabled());
        Log::set_enabled(true);
        assert!(Log::is_enabled());
    }

    #[test]
    #[serial]
    fn test_line_prefix_round_trip() {
        Log::set_line_prefix(Some("[07:30:00] ".to_string()));
        assert_eq!(Log::line_prefix(), "[07:30:00] ");
        Log::set_line_prefix(None);
        assert_eq!(Log::line_prefix(), "");
    }
}
