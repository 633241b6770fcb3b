//! Time source abstraction for real and simulated time.
//!
//! The scheduler never reads the system clock directly: every "now" comes from
//! the [`TimeSource`] held by the scheduler context. Production code uses
//! [`RealTimeSource`]; the `simulate` command and the tests use
//! [`SimulatedTimeSource`], which only moves when told to.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Get the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Check if this is a simulated time source.
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation backed by the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Fast-forward time source: time stands still until [`advance_to`] is called.
///
/// [`advance_to`]: SimulatedTimeSource::advance_to
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl SimulatedTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to `instant`. Moving backwards is ignored so simulated time stays monotonic.
    pub fn advance_to(&self, instant: DateTime<Utc>) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if instant > *guard {
            *guard = instant;
        }
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as wall-clock
/// time in `tz`.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Time {s} does not exist in timezone {tz}"))
}
