//! Calendar and clock primitives shared by the scheduler.
//!
//! - [`of_day`]: `HH:MM:SS` time-of-day value type
//! - [`day`]: weekday abbreviations used as day-bucket keys
//! - [`source`]: injectable clock with real and simulated implementations

pub mod day;
pub mod of_day;
pub mod source;

pub use day::DayOfWeek;
pub use of_day::TimeOfDay;
pub use source::{RealTimeSource, SimulatedTimeSource, TimeSource};

use chrono::{DateTime, Duration, LocalResult, NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;

/// Resolve a wall-clock `time` on `date` in `tz` to an instant.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant. Times
/// inside a DST gap (clocks springing forward) are shifted forward by the length
/// of the gap, so 02:30 on a spring-forward night becomes 03:30.
pub fn resolve_local(tz: Tz, date: NaiveDate, time: TimeOfDay) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time.to_naive_time());
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // Measure the gap from the offsets on either side of it
            let before = tz.from_local_datetime(&(naive - Duration::hours(3))).earliest()?;
            let after = tz.from_local_datetime(&(naive + Duration::hours(3))).latest()?;
            let gap = after.offset().fix().local_minus_utc() - before.offset().fix().local_minus_utc();
            tz.from_local_datetime(&(naive + Duration::seconds(i64::from(gap))))
                .earliest()
        }
    }
}
