//! Application-wide constants.

// # Capabilities

/// Capability carried by every schedule instance.
pub const SCHEDULE_CAPABILITY: &str = "sched";

/// Capability marking an instance as a weekly time-of-day schedule.
pub const WEEKLY_SCHEDULE_CAPABILITY: &str = "schedweek";

// # Commands

/// Message type used when a command does not name one.
pub const DEFAULT_MESSAGE_TYPE: &str = "base:SetAttributes";

/// Largest allowed distance, in minutes, between a relative command and its solar event.
pub const MAXIMUM_OFFSET_MINUTES: i32 = 12 * 60;

// # Next-fire search

/// Days examined when looking for the next fire: today plus a full week, so a
/// command whose time already passed today is found again one week later.
pub const NEXT_FIRE_SEARCH_DAYS: u64 = 8;

/// Scheduled ticks fire with "now" advanced by this many seconds so the command
/// that woke the dispatcher is never selected again.
pub const FIRE_ADVANCE_SECONDS: i64 = 1;

// # Configuration

pub const APP_NAME: &str = "sunsched";
pub const CONFIG_FILE_NAME: &str = "sunsched.toml";
pub const DEFAULT_TIMEZONE: &str = "UTC";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
