//! Sunrise and sunset times for a date and location.
//!
//! The scheduler consumes solar events through the [`SunriseSunsetProvider`]
//! trait so that the astronomy stays a pure function of `(date, location)`.
//! [`SolarCalculator`] is the production implementation, backed by the
//! `sunrise` crate.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::GeoLocation;

/// Sunrise and sunset instants for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunriseSunsetInfo {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Source of daily sunrise/sunset instants.
///
/// Implementations must be side-effect free: the same `(date, location)` always
/// yields the same answer, and calls may come from many threads at once.
#[cfg_attr(test, mockall::automock)]
pub trait SunriseSunsetProvider: Send + Sync {
    fn calculate(&self, date: NaiveDate, location: &GeoLocation) -> Result<SunriseSunsetInfo>;
}

/// Astronomical sunrise/sunset using the `sunrise` crate (sun's upper limb at
/// the horizon, standard refraction).
#[derive(Debug, Default, Clone, Copy)]
pub struct SolarCalculator;

impl SunriseSunsetProvider for SolarCalculator {
    fn calculate(&self, date: NaiveDate, location: &GeoLocation) -> Result<SunriseSunsetInfo> {
        let coord = Coordinates::new(location.latitude(), location.longitude())
            .ok_or_else(|| anyhow::anyhow!("Invalid coordinates: {location}"))?;
        let solar_day = SolarDay::new(coord, date);
        let sunrise = solar_day.event_time(SolarEvent::Sunrise);
        let sunset = solar_day.event_time(SolarEvent::Sunset);

        // Polar day/night: the sun never crosses the horizon and the
        // calculation degenerates
        if sunset <= sunrise || sunset - sunrise >= Duration::hours(24) {
            anyhow::bail!("No sunrise/sunset at {location} on {date}");
        }

        Ok(SunriseSunsetInfo { sunrise, sunset })
    }
}

/// Provider with the same local sunrise and sunset every day, optionally
/// drifting by a fixed number of minutes per day from an anchor date.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedSolarProvider {
    tz: chrono_tz::Tz,
    sunrise: crate::time::TimeOfDay,
    sunset: crate::time::TimeOfDay,
    drift: Option<(NaiveDate, i64)>,
}

#[cfg(any(test, feature = "testing-support"))]
impl FixedSolarProvider {
    pub fn new(tz: chrono_tz::Tz, sunrise: crate::time::TimeOfDay, sunset: crate::time::TimeOfDay) -> Self {
        Self {
            tz,
            sunrise,
            sunset,
            drift: None,
        }
    }

    /// Shift both events by `minutes_per_day` for every day after `anchor`.
    pub fn with_drift(mut self, anchor: NaiveDate, minutes_per_day: i64) -> Self {
        self.drift = Some((anchor, minutes_per_day));
        self
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl SunriseSunsetProvider for FixedSolarProvider {
    fn calculate(&self, date: NaiveDate, _location: &GeoLocation) -> Result<SunriseSunsetInfo> {
        let shift = match self.drift {
            Some((anchor, minutes)) => Duration::minutes((date - anchor).num_days() * minutes),
            None => Duration::zero(),
        };
        let at = |time: crate::time::TimeOfDay| {
            crate::time::resolve_local(self.tz, date, time)
                .map(|dt| dt.with_timezone(&Utc) + shift)
                .ok_or_else(|| anyhow::anyhow!("Unresolvable local time {time} on {date}"))
        };
        Ok(SunriseSunsetInfo {
            sunrise: at(self.sunrise)?,
            sunset: at(self.sunset)?,
        })
    }
}
